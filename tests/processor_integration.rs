//! End-to-end runs of the mapping processor against temp directories.
//!
//! Environment variables come from a map instead of the process env so tests
//! can run in parallel.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use secretmap::{ConfigError, DiagnosticKind, Processor, RunOptions, Target};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    env: BTreeMap<String, String>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            env: BTreeMap::new(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, text: &str) -> PathBuf {
        let p = self.path(name);
        fs::write(&p, text).unwrap();
        p
    }

    /// The mapping used throughout: one JSON source, one env var.
    fn app_mapping(&mut self) -> PathBuf {
        let json = self.write("app.json", r#"{"api_key": "xyz", "cert": "line1\nline2"}"#);
        self.env.insert("DB_PASS".into(), "secret1".into());
        self.write(
            "mapping.yaml",
            &format!(
                "files:\n  app: {}\nfrom_env:\n  DB_PASS: db_password\napp:\n  api_key: API_KEY\n",
                json.display()
            ),
        )
    }

    fn opts(&self, mapping: &Path, target: Target) -> RunOptions {
        let mut o = RunOptions::new(mapping, target);
        o.output = self.path(".env_encoded");
        o
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn docker_target_writes_plain_prefixed_lines() {
    let mut fx = Fixture::new();
    let mapping = fx.app_mapping();
    let opts = fx.opts(&mapping, Target::Docker);

    let report = Processor::new(&fx.env)
        .run(&opts, &mut std::io::sink())
        .unwrap();

    assert_eq!(report.written, 2);
    assert!(report.diagnostics.is_empty());
    assert_eq!(
        read(&opts.output),
        "SECRET_db_password=secret1\nSECRET_API_KEY=xyz\n"
    );
}

#[test]
fn kestra_target_base64_encodes_every_value() {
    let mut fx = Fixture::new();
    let mapping = fx.app_mapping();
    let opts = fx.opts(&mapping, Target::Kestra);

    Processor::new(&fx.env).run(&opts, &mut std::io::sink()).unwrap();

    let text = read(&opts.output);
    let mut decoded = BTreeMap::new();
    for line in text.lines() {
        let (k, v) = line.split_once('=').unwrap();
        let bytes = BASE64_STANDARD.decode(v).unwrap();
        decoded.insert(k.to_string(), String::from_utf8(bytes).unwrap());
    }

    assert_eq!(decoded["SECRET_API_KEY"], "xyz");
    assert_eq!(decoded["SECRET_db_password"], "secret1");
}

#[test]
fn custom_prefix_applies_to_docker() {
    let mut fx = Fixture::new();
    let mapping = fx.app_mapping();
    let mut opts = fx.opts(&mapping, Target::Docker);
    opts.prefix = "APP_".into();

    Processor::new(&fx.env).run(&opts, &mut std::io::sink()).unwrap();

    assert_eq!(read(&opts.output), "APP_db_password=secret1\nAPP_API_KEY=xyz\n");
}

#[test]
fn export_target_prints_to_stdout_only() {
    let mut fx = Fixture::new();
    let mapping = fx.app_mapping();
    let opts = fx.opts(&mapping, Target::ExportToEnv);
    let mut stdout: Vec<u8> = Vec::new();

    let report = Processor::new(&fx.env).run(&opts, &mut stdout).unwrap();

    assert!(report.destination.is_none());
    assert!(!opts.output.exists());
    assert_eq!(
        String::from_utf8(stdout).unwrap(),
        "export SECRET_db_password='secret1'\nexport SECRET_API_KEY='xyz'\n"
    );
}

#[test]
fn missing_env_var_is_skipped_not_fatal() {
    let mut fx = Fixture::new();
    let mapping = fx.app_mapping();
    fx.env.clear();
    let opts = fx.opts(&mapping, Target::Docker);

    let report = Processor::new(&fx.env).run(&opts, &mut std::io::sink()).unwrap();

    assert_eq!(report.written, 1);
    assert_eq!(report.diagnostics.count(DiagnosticKind::MissingEnvVar), 1);
    assert_eq!(read(&opts.output), "SECRET_API_KEY=xyz\n");
}

#[test]
fn newlines_are_escaped_in_env_output() {
    let mut fx = Fixture::new();
    let json = fx.write("app.json", r#"{"cert": "line1\nline2"}"#);
    let mapping = fx.write(
        "mapping.yaml",
        &format!("files:\n  app: {}\napp:\n  cert: CERT\n", json.display()),
    );
    let opts = fx.opts(&mapping, Target::Docker);

    Processor::new(&fx.env).run(&opts, &mut std::io::sink()).unwrap();

    assert_eq!(read(&opts.output), "SECRET_CERT=line1\\nline2\n");
}

#[test]
fn missing_json_key_is_reported_and_skipped() {
    let mut fx = Fixture::new();
    let json = fx.write("app.json", r#"{"api_key": "xyz"}"#);
    let mapping = fx.write(
        "mapping.yaml",
        &format!(
            "files:\n  app: {}\napp:\n  api_key: API_KEY\n  missing: MISSING\n",
            json.display()
        ),
    );
    let opts = fx.opts(&mapping, Target::Docker);

    let report = Processor::new(&fx.env).run(&opts, &mut std::io::sink()).unwrap();

    assert_eq!(report.resolved, 1);
    assert_eq!(report.diagnostics.count(DiagnosticKind::MissingKey), 1);
    assert_eq!(read(&opts.output), "SECRET_API_KEY=xyz\n");
}

#[test]
fn missing_source_file_aborts_without_touching_output() {
    let fx = Fixture::new();
    let mapping = fx.write(
        "mapping.yaml",
        "files:\n  app: /no/such/app.json\napp:\n  api_key: API_KEY\n",
    );
    let opts = fx.opts(&mapping, Target::Docker);
    fs::write(&opts.output, "KEEP=1\n").unwrap();

    let err = Processor::new(&fx.env)
        .run(&opts, &mut std::io::sink())
        .unwrap_err();

    assert!(matches!(err, ConfigError::SourceFileNotFound { .. }));
    assert_eq!(read(&opts.output), "KEEP=1\n");
}

#[test]
fn malformed_source_json_is_fatal() {
    let fx = Fixture::new();
    let json = fx.write("app.json", "{not json");
    let mapping = fx.write(
        "mapping.yaml",
        &format!("files:\n  app: {}\n", json.display()),
    );

    let err = Processor::new(&fx.env)
        .run(&fx.opts(&mapping, Target::Kestra), &mut std::io::sink())
        .unwrap_err();

    assert!(matches!(err, ConfigError::SourceParse { .. }));
}

#[test]
fn missing_mapping_file_is_fatal() {
    let fx = Fixture::new();
    let err = Processor::new(&fx.env)
        .run(&fx.opts(&fx.path("nope.yaml"), Target::Docker), &mut std::io::sink())
        .unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }));
}

const SECRETS_TOML: &str = r#"[destination.bigquery]
location = "US"

[destination.bigquery.credentials]
project_id = "project_id"
private_key = "private_key"
client_email = "client_email"

[runtime]
log_level = "WARNING"
"#;

#[test]
fn toml_target_updates_existing_leaves_only() {
    let mut fx = Fixture::new();
    let json = fx.write(
        "sa.json",
        r#"{"project_id": "proj-1", "private_key": "-----BEGIN-----\nabc", "client_email": "sa@proj-1.iam"}"#,
    );
    fx.env.insert("BQ_LOCATION".into(), "EU".into());
    let mapping = fx.write(
        "mapping.yaml",
        &format!(
            r#"files:
  sa: {}
from_env:
  BQ_LOCATION: destination__bigquery__location
sa:
  project_id: destination__bigquery__credentials__project_id
  private_key: destination__bigquery__credentials__private_key
  client_email: destination__bigquery__credentials__not_there
"#,
            json.display()
        ),
    );
    let secrets = fx.write("secrets.toml", SECRETS_TOML);
    let mut opts = fx.opts(&mapping, Target::DltDestBigquery);
    opts.secrets_toml = Some(secrets.clone());

    let report = Processor::new(&fx.env).run(&opts, &mut std::io::sink()).unwrap();

    assert_eq!(report.written, 3);
    assert_eq!(
        report.diagnostics.count(DiagnosticKind::MissingDestinationPath),
        1
    );

    let doc: toml::Table = toml::from_str(&read(&secrets)).unwrap();
    let mut expected: toml::Table = toml::from_str(SECRETS_TOML).unwrap();
    {
        let mut bq = expected["destination"]["bigquery"].as_table().unwrap().clone();
        bq.insert("location".into(), "EU".into());
        let creds = bq.get_mut("credentials").unwrap().as_table_mut().unwrap();
        creds.insert("project_id".into(), "proj-1".into());
        creds.insert("private_key".into(), "-----BEGIN-----\nabc".into());
        expected
            .get_mut("destination")
            .unwrap()
            .as_table_mut()
            .unwrap()
            .insert("bigquery".into(), toml::Value::Table(bq));
    }
    assert_eq!(doc, expected);
    assert!(!opts.output.exists());
}

#[test]
fn toml_target_without_secrets_toml_fails_before_reading() {
    let fx = Fixture::new();
    let opts = fx.opts(&fx.path("does-not-matter.yaml"), Target::DltDestBigquery);

    let err = Processor::new(&fx.env)
        .run(&opts, &mut std::io::sink())
        .unwrap_err();

    assert!(matches!(err, ConfigError::MissingSecretsToml));
}

#[test]
fn literal_section_feeds_toml_target() {
    let fx = Fixture::new();
    let mapping = fx.write(
        "mapping.yaml",
        "from_env: {}\ndirect:\n  my-dataset-location: destination__bigquery__location\n",
    );
    let secrets = fx.write("secrets.toml", SECRETS_TOML);
    let mut opts = fx.opts(&mapping, Target::DltDestBigquery);
    opts.secrets_toml = Some(secrets.clone());

    let report = Processor::new(&fx.env).run(&opts, &mut std::io::sink()).unwrap();

    assert_eq!(report.written, 1);
    let doc: toml::Table = toml::from_str(&read(&secrets)).unwrap();
    assert_eq!(
        doc["destination"]["bigquery"]["location"].as_str(),
        Some("my-dataset-location")
    );
}

#[test]
fn null_json_value_still_produces_a_line() {
    let fx = Fixture::new();
    let json = fx.write("app.json", r#"{"api_key": null}"#);
    let mapping = fx.write(
        "mapping.yaml",
        &format!("files:\n  app: {}\napp:\n  api_key: API_KEY\n", json.display()),
    );
    let opts = fx.opts(&mapping, Target::Docker);

    let report = Processor::new(&fx.env).run(&opts, &mut std::io::sink()).unwrap();

    assert_eq!(report.written, 1);
    assert!(report.diagnostics.is_empty());
    assert_eq!(read(&opts.output), "SECRET_API_KEY=null\n");
}

#[test]
fn duplicate_env_destination_keeps_first_entry() {
    let mut fx = Fixture::new();
    let json = fx.write("app.json", r#"{"api_key": "xyz"}"#);
    fx.env.insert("K".into(), "fromenv".into());
    let mapping = fx.write(
        "mapping.yaml",
        &format!(
            "files:\n  app: {}\nfrom_env:\n  K: API_KEY\napp:\n  api_key: API_KEY\n",
            json.display()
        ),
    );
    let opts = fx.opts(&mapping, Target::Docker);

    let report = Processor::new(&fx.env).run(&opts, &mut std::io::sink()).unwrap();

    assert_eq!(report.resolved, 2);
    assert_eq!(report.written, 1);
    assert_eq!(
        report.diagnostics.count(DiagnosticKind::DuplicateDestination),
        1
    );
    assert_eq!(read(&opts.output), "SECRET_API_KEY=fromenv\n");
}

#[test]
fn toml_target_reaches_mixed_case_keys() {
    let mut fx = Fixture::new();
    fx.env.insert("K".into(), "new".into());
    let mapping = fx.write("mapping.yaml", "from_env:\n  K: Creds__API_KEY\n");
    let secrets = fx.write("secrets.toml", "[Creds]\nAPI_KEY = \"old\"\n");
    let mut opts = fx.opts(&mapping, Target::DltDestBigquery);
    opts.secrets_toml = Some(secrets.clone());

    let report = Processor::new(&fx.env).run(&opts, &mut std::io::sink()).unwrap();

    assert_eq!(report.written, 1);
    assert!(report.diagnostics.is_empty());
    let doc: toml::Table = toml::from_str(&read(&secrets)).unwrap();
    assert_eq!(doc["Creds"]["API_KEY"].as_str(), Some("new"));
}
