use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub package: PackageConfig,
    #[serde(default)]
    pub container: ContainerConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Settings {
    /// Rule set names consulted when none are given on the command line.
    /// Kept as strings so an unknown name is skipped instead of failing the parse.
    #[serde(default)]
    pub rule_sets: Vec<String>,
    /// Decision log path; `~` and `$VARS` are expanded. Empty disables logging.
    #[serde(default)]
    pub log_file: String,
    #[serde(default)]
    pub log_level: String,
    #[serde(default)]
    pub max_input_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct GitConfig {
    #[serde(default)]
    pub extra_escape: Vec<String>,
}

/// `npx <tool>` → `with`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ToolReplacement {
    pub tool: String,
    pub with: String,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct PackageConfig {
    #[serde(default)]
    pub extra_escape: Vec<String>,
    #[serde(default)]
    pub replacements: Vec<ToolReplacement>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ContainerConfig {
    /// Command prefix that runs something inside a compose service.
    #[serde(default)]
    pub exec: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub host_roots: Vec<String>,
    #[serde(default)]
    pub extra_escape: Vec<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    settings: SettingsOverlay,
    #[serde(default)]
    git: GitOverlay,
    #[serde(default)]
    package: PackageOverlay,
    #[serde(default)]
    container: ContainerOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsOverlay {
    rule_sets: Option<Vec<String>>,
    log_file: Option<String>,
    log_level: Option<String>,
    max_input_bytes: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct GitOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    extra_escape: Vec<String>,
    #[serde(default)]
    remove_extra_escape: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PackageOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    extra_escape: Vec<String>,
    #[serde(default)]
    remove_extra_escape: Vec<String>,
    #[serde(default)]
    replacements: Vec<ToolReplacement>,
    /// Tool names whose default replacement is dropped.
    #[serde(default)]
    remove_replacements: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ContainerOverlay {
    #[serde(default)]
    replace: bool,
    exec: Option<String>,
    service: Option<String>,
    #[serde(default)]
    host_roots: Vec<String>,
    #[serde(default)]
    remove_host_roots: Vec<String>,
    #[serde(default)]
    extra_escape: Vec<String>,
    #[serde(default)]
    remove_extra_escape: Vec<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

/// Like `merge_list`, keyed by tool name: a user entry for an existing tool
/// overrides its replacement in place.
fn merge_replacements(
    base: &mut Vec<ToolReplacement>,
    add: Vec<ToolReplacement>,
    remove: &[String],
    replace: bool,
) {
    if replace {
        *base = add;
        return;
    }
    base.retain(|r| !remove.contains(&r.tool));
    for item in add {
        match base.iter_mut().find(|r| r.tool == item.tool) {
            Some(existing) => existing.with = item.with,
            None => base.push(item),
        }
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/cc-workflowgate/config.toml (if exists)
    ///
    /// User config merges with defaults: lists extend, scalars override.
    /// Set `replace = true` in any section to replace its defaults entirely.
    /// Use `remove_<field>` lists to subtract specific items from defaults.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config
    }

    /// Try to load user overlay from ~/.config/cc-workflowgate/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/cc-workflowgate/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                eprintln!("cc-workflowgate: config parse error: {e}");
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        // Settings: scalar overrides
        let s = overlay.settings;
        if let Some(v) = s.rule_sets {
            self.settings.rule_sets = v;
        }
        if let Some(v) = s.log_file {
            self.settings.log_file = v;
        }
        if let Some(v) = s.log_level {
            self.settings.log_level = v;
        }
        if let Some(v) = s.max_input_bytes {
            self.settings.max_input_bytes = v;
        }

        // Git
        let g = overlay.git;
        merge_list(
            &mut self.git.extra_escape,
            g.extra_escape,
            &g.remove_extra_escape,
            g.replace,
        );

        // Package
        let p = overlay.package;
        merge_list(
            &mut self.package.extra_escape,
            p.extra_escape,
            &p.remove_extra_escape,
            p.replace,
        );
        merge_replacements(
            &mut self.package.replacements,
            p.replacements,
            &p.remove_replacements,
            p.replace,
        );

        // Container
        let c = overlay.container;
        merge_list(
            &mut self.container.host_roots,
            c.host_roots,
            &c.remove_host_roots,
            c.replace,
        );
        merge_list(
            &mut self.container.extra_escape,
            c.extra_escape,
            &c.remove_extra_escape,
            c.replace,
        );
        if let Some(v) = c.exec {
            self.container.exec = v;
        }
        if let Some(v) = c.service {
            self.container.service = v;
        }
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    pub(crate) fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
