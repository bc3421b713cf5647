use std::{fs, io::Cursor, path::Path};

use anyhow::{bail, Context, Result};

use crate::env::EnvMap;

/// Reads a dotenv file into a fresh variable map.
pub fn load_env_file(path: &Path) -> Result<EnvMap> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading env file {}", path.display()))?;

    let mut env = EnvMap::new();
    for item in dotenvy::from_read_iter(Cursor::new(content)) {
        let (key, value) = item.with_context(|| format!("parsing env file {}", path.display()))?;
        env.insert(key, value);
    }

    Ok(env)
}

/// Splits a `KEY=VALUE` argument. The value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Expected KEY=VALUE, got {raw}");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Empty key in assignment {raw}");
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn load_env_file_reads_values() -> Result<()> {
        let temp = tempdir()?;
        let env_path = temp.path().join("staging.env");
        fs::write(&env_path, "HOST=https://staging.example.com\n# note\nTOKEN=\"abc 123\"\n")?;

        let env = load_env_file(&env_path)?;

        assert_eq!(env.len(), 2);
        assert_eq!(
            env.get("HOST").map(String::as_str),
            Some("https://staging.example.com")
        );
        assert_eq!(env.get("TOKEN").map(String::as_str), Some("abc 123"));
        Ok(())
    }

    #[test]
    fn load_env_file_propagates_io_errors() {
        let err = load_env_file(Path::new("does-not-exist.env")).unwrap_err();
        assert!(err.to_string().contains("reading env file"));
    }

    #[test]
    fn parse_assignment_splits_on_first_equals() -> Result<()> {
        assert_eq!(
            parse_assignment("filter=a=b")?,
            ("filter".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("empty=")?,
            ("empty".to_string(), String::new())
        );
        Ok(())
    }

    #[test]
    fn parse_assignment_rejects_malformed_input() {
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=value").is_err());
    }
}
