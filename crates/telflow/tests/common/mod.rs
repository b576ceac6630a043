use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const TWO_RESOURCES: &str = r#"
resources:
  - name: alerts
    type: twilio_messaging_service
    attributes:
      friendly_name: alerts
      sticky_sender: true
  - name: support-line
    type: twilio_phone_number
    attributes:
      country_code: US
      area_code: "415"
      service_sid: "{{ alerts.id }}"
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_resources(&self, content: &str) {
        fs::write(self.root.path().join("telflow.resources.yaml"), content).unwrap();
    }

    #[allow(dead_code)]
    pub fn write_state(&self, content: &str) {
        let dir = self.root.path().join(".telflow");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("state.json"), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// `telflow` run inside the project with no ambient credentials
    pub fn telflow(&self) -> Command {
        let mut cmd = Command::cargo_bin("telflow").unwrap();
        cmd.current_dir(self.path())
            .env_remove("TWILIO_ACCOUNT_SID")
            .env_remove("TWILIO_AUTH_TOKEN")
            .env_remove("TWILIO_ENDPOINT")
            .env_remove("TELFLOW_SELECTION_POLICY")
            .env_remove("TELFLOW_CONFIG_PATH")
            .env_remove("TELFLOW_PROJECT_DIR")
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env("NO_COLOR", "1");
        cmd
    }
}
