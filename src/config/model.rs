// src/config/model.rs

use serde::{Deserialize, Serialize};

/// Resolved engine configuration.
///
/// Every field has a default, so a caller may supply any subset of the tree
/// and still get a complete configuration back from [`crate::config::resolve`].
/// The value is created once per engine instance and never mutated.
///
/// ```toml
/// port = 35729
/// prefix = "site"
///
/// [client]
/// cwd = "client/src"
/// dest = "public"
///
/// [client.scripts]
/// src = ["app.js", "views/**/*.js"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Project root all relative paths and watch patterns resolve against.
    pub root: String,

    /// Port the live-reload listener binds; artifact paths in reload
    /// notifications are reported relative to the tree served behind it.
    pub port: u16,

    /// Optional instance prefix applied to every task name, so a host can
    /// mount several engine instances without collisions.
    pub prefix: Option<String>,

    /// Task names to suppress. Presence wins over `only`, even when the
    /// list is explicitly empty.
    pub exclude: Option<Vec<String>>,

    /// Allow-list of base task names; everything else is suppressed.
    /// Ignored whenever `exclude` is present.
    pub only: Option<Vec<String>>,

    /// Emit a warning each time a suppressed task is invoked.
    pub warn_exclusions: bool,

    pub server: ServerSection,
    pub client: ClientSection,
    pub test: TestSection,
    pub manifests: ManifestsSection,
    pub package_manager: PackageManagerSection,
}

impl Configuration {
    /// Effective instance prefix; an empty string counts as "no prefix".
    pub fn effective_prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            port: 35729,
            prefix: None,
            exclude: None,
            only: None,
            warn_exclusions: false,
            server: ServerSection::default(),
            client: ClientSection::default(),
            test: TestSection::default(),
            manifests: ManifestsSection::default(),
            package_manager: PackageManagerSection::default(),
        }
    }
}

/// `[server]` section: the subordinate server process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Working directory of the server sources.
    pub cwd: String,
    /// Entry point script of the subordinate server.
    pub main: String,
    /// Patterns whose changes restart the subordinate server.
    pub watch: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            cwd: "server".to_string(),
            main: "server/main.js".to_string(),
            watch: vec!["server/**/*.js".to_string()],
        }
    }
}

/// `[client]` section: source layout of the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// Directory holding third-party front-end libraries.
    pub lib: String,
    /// Directory holding first-party client sources.
    pub cwd: String,
    /// Destination directory for built artifacts.
    pub dest: String,

    pub html: HtmlSection,
    pub scripts: ScriptsSection,
    pub styles: StylesSection,
    pub templates: TemplatesSection,
    pub images: ImagesSection,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            lib: "client/lib".to_string(),
            cwd: "client/src".to_string(),
            dest: "dist".to_string(),
            html: HtmlSection::default(),
            scripts: ScriptsSection::default(),
            styles: StylesSection::default(),
            templates: TemplatesSection::default(),
            images: ImagesSection::default(),
        }
    }
}

/// `[client.html]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlSection {
    pub src: Vec<String>,
}

impl Default for HtmlSection {
    fn default() -> Self {
        Self {
            src: vec!["**/*.html".to_string()],
        }
    }
}

/// `[client.scripts]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsSection {
    pub cwd: String,
    pub dest: String,
    /// Library patterns, resolved under `client.lib`.
    pub lib: Vec<String>,
    /// Source patterns, resolved under `client.cwd` + `cwd`.
    pub src: Vec<String>,
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            cwd: "scripts".to_string(),
            dest: "scripts".to_string(),
            lib: Vec::new(),
            src: vec!["**/*.js".to_string()],
        }
    }
}

/// `[client.styles]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesSection {
    pub cwd: String,
    pub dest: String,
    pub src: Vec<String>,
    pub include: IncludeSection,
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            cwd: "styles".to_string(),
            dest: "styles".to_string(),
            src: vec!["**/*.css".to_string()],
            include: IncludeSection::default(),
        }
    }
}

/// `[client.styles.include]` section: extra include paths for the style
/// compiler, resolved separately under the source and library roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IncludeSection {
    pub lib: Vec<String>,
    pub src: Vec<String>,
}

/// `[client.templates]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesSection {
    pub cwd: String,
    pub src: Vec<String>,
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            cwd: "templates".to_string(),
            src: vec!["**/*.html".to_string()],
        }
    }
}

/// `[client.images]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesSection {
    pub cwd: String,
    pub src: Vec<String>,
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            cwd: "images".to_string(),
            src: vec![
                "**/*.png".to_string(),
                "**/*.jpg".to_string(),
                "**/*.gif".to_string(),
                "**/*.svg".to_string(),
            ],
        }
    }
}

/// `[test]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSection {
    /// Entry point of the test suite.
    pub main: String,
    /// Patterns whose changes re-run the suite in `autotest` mode.
    pub watch: Vec<String>,
}

impl Default for TestSection {
    fn default() -> Self {
        Self {
            main: "test/main.js".to_string(),
            watch: vec!["test/**/*.js".to_string()],
        }
    }
}

/// `[manifests]` section: files whose changes trigger self-restart paths in
/// development mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestsSection {
    /// Package manifest; a change reinstalls and prunes dependencies.
    pub package: String,
    /// Front-end library manifest; a change reinstalls libraries and
    /// rebuilds in a fresh process.
    pub libraries: String,
}

impl Default for ManifestsSection {
    fn default() -> Self {
        Self {
            package: "package.json".to_string(),
            libraries: "bower.json".to_string(),
        }
    }
}

/// `[package_manager]` section: commands the restart paths shell out to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageManagerSection {
    pub install: String,
    pub prune: String,
    pub install_libraries: String,
}

impl Default for PackageManagerSection {
    fn default() -> Self {
        Self {
            install: "npm install".to_string(),
            prune: "npm prune".to_string(),
            install_libraries: "bower install".to_string(),
        }
    }
}
