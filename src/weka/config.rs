use std::ffi::OsString;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How to launch the toolkit JVM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WekaConfig {
    /// Java executable.
    pub java: String,
    /// Max heap in GB (`-Xmx<N>G`).
    pub heap_gb: u32,
    /// Classpath entries: weka.jar, the matrix library J48 needs, and `.`.
    pub classpath: Vec<PathBuf>,
}

impl Default for WekaConfig {
    fn default() -> Self {
        Self {
            java: "java".to_string(),
            heap_gb: 2,
            classpath: vec![
                PathBuf::from("model/weka.jar"),
                PathBuf::from("model/mtj-1.0.4.jar"),
                PathBuf::from("."),
            ],
        }
    }
}

impl WekaConfig {
    /// Entries joined with the platform separator (`:` or `;`).
    pub fn classpath_string(&self) -> OsString {
        std::env::join_paths(&self.classpath).unwrap_or_else(|e| {
            log::warn!("classpath entry contains a separator ({e}), joining verbatim");
            let sep = if cfg!(windows) { ";" } else { ":" };
            let parts: Vec<String> = self
                .classpath
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            OsString::from(parts.join(sep))
        })
    }

    /// Override the weka.jar entry (first classpath slot).
    pub fn set_weka_jar(&mut self, jar: PathBuf) {
        self.set_slot(0, jar);
    }

    /// Override the matrix-library jar (second classpath slot).
    pub fn set_mtj_jar(&mut self, jar: PathBuf) {
        self.set_slot(1, jar);
    }

    fn set_slot(&mut self, idx: usize, jar: PathBuf) {
        if idx < self.classpath.len() {
            self.classpath[idx] = jar;
        } else {
            self.classpath.push(jar);
        }
    }

    /// JVM flags that precede the scheme arguments.
    pub fn jvm_args(&self) -> Vec<OsString> {
        vec![
            OsString::from(format!("-Xmx{}G", self.heap_gb)),
            OsString::from("-cp"),
            self.classpath_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_bundled_jars() {
        let cfg = WekaConfig::default();
        let cp = cfg.classpath_string().into_string().unwrap();
        let sep = if cfg!(windows) { ";" } else { ":" };
        assert_eq!(cp, ["model/weka.jar", "model/mtj-1.0.4.jar", "."].join(sep));
        assert_eq!(cfg.jvm_args()[0], OsString::from("-Xmx2G"));
    }

    #[test]
    fn jar_overrides_replace_slots() {
        let mut cfg = WekaConfig {
            classpath: vec![],
            ..WekaConfig::default()
        };
        cfg.set_weka_jar("/opt/weka/weka.jar".into());
        cfg.set_mtj_jar("/opt/weka/mtj.jar".into());
        assert_eq!(
            cfg.classpath,
            vec![PathBuf::from("/opt/weka/weka.jar"), PathBuf::from("/opt/weka/mtj.jar")]
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: WekaConfig = toml::from_str("heap_gb = 4").unwrap();
        assert_eq!(cfg.heap_gb, 4);
        assert_eq!(cfg.java, "java");
        assert_eq!(cfg.classpath.len(), 3);
    }
}
