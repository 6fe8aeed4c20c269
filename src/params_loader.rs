use crate::params::{OsImage, ParameterSet};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and validate a parameter set from a YAML file
pub fn load_params(params_path: &Path) -> Result<ParameterSet> {
    info!("Loading parameters from: {:?}", params_path);

    let file = File::open(params_path)
        .wrap_err_with(|| format!("Failed to open parameter file '{}'", params_path.display()))?;

    let params: ParameterSet = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse parameter file '{}'", params_path.display()))?;

    params.validate()?;

    Ok(params)
}

/// CLI arguments that override values from the parameter file
#[derive(Debug, Clone, Default)]
pub struct ParamOverrides {
    pub client_count: Option<u32>,
    pub phystype: Option<String>,
    pub os_image: Option<OsImage>,
}

/// Apply CLI overrides to a parameter set
pub fn apply_overrides(params: &mut ParameterSet, overrides: &ParamOverrides) -> Result<()> {
    if let Some(client_count) = overrides.client_count {
        info!("Overriding clientCount: {} -> {}", params.client_count, client_count);
        params.client_count = client_count;
    }

    if let Some(phystype) = &overrides.phystype {
        info!("Overriding phystype: {:?} -> {:?}", params.phystype, phystype);
        params.phystype = phystype.clone();
    }

    if let Some(os_image) = overrides.os_image {
        info!("Overriding osImage: {} -> {}", params.os_image.label(), os_image.label());
        params.os_image = os_image;
    }

    // Re-validate after applying overrides
    params.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_params() {
        let yaml = r#"
clientCount: 3
phystype: "c220g2"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let params = load_params(temp_file.path()).unwrap();
        assert_eq!(params.client_count, 3);
        assert_eq!(params.phystype, "c220g2");
        assert_eq!(params.os_image, OsImage::MpiCuda);
    }

    #[test]
    fn test_load_rejects_invalid_params() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "phystype: \"c240g5 d430\"").unwrap();
        assert!(load_params(temp_file.path()).is_err());

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "clientCount: -1").unwrap();
        assert!(load_params(temp_file.path()).is_err());

        // Large counts are not capped
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "clientCount: 1000").unwrap();
        assert_eq!(load_params(temp_file.path()).unwrap().client_count, 1000);

        assert!(load_params(Path::new("/nonexistent/params.yaml")).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut params = ParameterSet::default();

        let overrides = ParamOverrides {
            client_count: Some(7),
            phystype: Some(String::new()),
            os_image: None,
        };

        apply_overrides(&mut params, &overrides).unwrap();
        assert_eq!(params.client_count, 7);
        assert_eq!(params.phystype, "");
        assert_eq!(params.os_image, OsImage::MpiCuda);

        let overrides = ParamOverrides {
            phystype: Some("bad type".to_string()),
            ..Default::default()
        };
        assert!(apply_overrides(&mut params, &overrides).is_err());
    }
}
