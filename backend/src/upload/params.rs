use shared::DetectionModel;

use super::UploadForm;

/// Text parts for one service: the optional parameters the client actually
/// sent, verbatim, followed by the service's forced `true` flag.
pub fn outbound_fields(model: DetectionModel, form: &UploadForm) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = model
        .parameter_names()
        .iter()
        .filter_map(|name| {
            form.field(name)
                .map(|value| (name.to_string(), value.to_string()))
        })
        .collect();
    fields.push((model.forced_flag().to_string(), "true".to_string()));
    fields
}

/// `name=value` pairs for logging; unset parameters print as `-`.
pub fn describe_parameters(model: DetectionModel, form: &UploadForm) -> String {
    model
        .parameter_names()
        .iter()
        .map(|name| format!("{}={}", name, form.field(name).unwrap_or("-")))
        .chain(std::iter::once(format!("{}=true", model.forced_flag())))
        .collect::<Vec<_>>()
        .join(" ")
}
