// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::{Config, CredentialSource, SyncSettings};
use crate::services::ServiceAccountKey;
use crate::utils::report;

/// Check configuration, environment settings and the service account key
/// without contacting any remote service.
pub fn run_validate(config: &Config, settings: &SyncSettings) -> Result<()> {
    report::header("Validating configuration");

    if let Err(e) = config.validate() {
        log::error!("Configuration invalid: {}", e);
        return Err(e);
    }
    log::info!("Configuration OK");
    report::sub_item(&format!("Image mode: {:?}", config.sync.image_mode));
    report::sub_item(&format!("Output format: {:?}", config.sync.output_format));
    report::sub_item(&format!("Data dir: {}", config.paths.data_dir.display()));

    let key = ServiceAccountKey::load(&settings.credentials).inspect_err(|e| {
        log::error!("Credentials unusable: {}", e);
    })?;
    let source = match &settings.credentials {
        CredentialSource::Inline(_) => "SERVICE_ACCOUNT_JSON".to_string(),
        CredentialSource::File(path) => path.display().to_string(),
    };
    log::info!("Credentials OK ({})", source);
    report::sub_item(&format!("Service account: {}", key.client_email));

    log::info!("Spreadsheet {}", settings.spreadsheet_id);
    for sheet in &settings.sheets {
        report::sub_item(&format!(
            "{} -> {} (image column '{}', subdir '{}')",
            sheet.sheet_name, sheet.key, sheet.image_column, sheet.image_subdir
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SheetConfig;

    fn settings(credentials: CredentialSource) -> SyncSettings {
        SyncSettings {
            credentials,
            application_name: "GoogleSheetsSync".to_string(),
            spreadsheet_id: "sheet-id".to_string(),
            sheets: vec![SheetConfig {
                key: "members".to_string(),
                sheet_name: "Members".to_string(),
                image_column: "image".to_string(),
                image_subdir: "remote_members".to_string(),
            }],
        }
    }

    #[test]
    fn accepts_defaults_with_parsable_key() {
        let key = r#"{"client_email":"a@b.iam.gserviceaccount.com","private_key":"k"}"#;
        let result = run_validate(
            &Config::default(),
            &settings(CredentialSource::Inline(key.to_string())),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_bad_config_and_bad_key() {
        let mut config = Config::default();
        config.images.jpeg_quality = 0;
        let good = settings(CredentialSource::Inline(
            r#"{"client_email":"a","private_key":"k"}"#.to_string(),
        ));
        assert!(run_validate(&config, &good).is_err());

        let bad = settings(CredentialSource::Inline("not json".to_string()));
        assert!(run_validate(&Config::default(), &bad).unwrap_err().is_auth());
    }
}
