//! Sprint milestone labels derived from the latest released version of each
//! tracked product.

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// First `major[.minor[.patch]]` found in `text`, missing parts being 0.
    pub fn coerce(text: &str) -> Option<Self> {
        static VERSION_RE: OnceLock<Option<Regex>> = OnceLock::new();
        let re = VERSION_RE
            .get_or_init(|| Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").ok())
            .as_ref()?;
        let caps = re.captures(text)?;
        let part = |i: usize| {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        Some(Self {
            major: caps.get(1)?.as_str().parse().ok()?,
            minor: part(2),
            patch: part(3),
        })
    }
}

/// Where a product publishes its version and how to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionDocument {
    /// A Maven pom; the version following the given artifact id.
    Pom { artifact: &'static str },
    /// A bare `major.minor` text file.
    PlainText,
    /// An npm package.json.
    PackageJson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFormat {
    MajorMinor,
    MajorMinorPatch,
    MajorMinorPatchGa,
}

/// A tracked product line: version source, milestone naming and the minor
/// version offsets of its previous, current and next sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductLine {
    pub name: &'static str,
    pub url: &'static str,
    pub document: VersionDocument,
    pub format: LabelFormat,
    pub offsets: [i64; 3],
    /// Milestones of this product only apply to issues under this URL.
    pub link_prefix: Option<&'static str>,
}

pub const CHE: ProductLine = ProductLine {
    name: "che",
    url: "https://raw.githubusercontent.com/eclipse-che/che-server/HEAD/pom.xml",
    document: VersionDocument::Pom { artifact: "che-server" },
    format: LabelFormat::MajorMinor,
    offsets: [-1, 0, 1],
    link_prefix: None,
};

pub const CRW: ProductLine = ProductLine {
    name: "crw",
    url: "https://raw.githubusercontent.com/redhat-developer/codeready-workspaces/HEAD/dependencies/VERSION",
    document: VersionDocument::PlainText,
    format: LabelFormat::MajorMinorPatchGa,
    offsets: [-2, -1, 0],
    link_prefix: None,
};

pub const THEIA: ProductLine = ProductLine {
    name: "theia",
    url: "https://raw.githubusercontent.com/eclipse-theia/theia/master/packages/core/package.json",
    document: VersionDocument::PackageJson,
    format: LabelFormat::MajorMinorPatch,
    offsets: [0, 1, 2],
    link_prefix: Some("https://github.com/eclipse-theia/theia"),
};

pub const PRODUCT_LINES: [ProductLine; 3] = [CHE, CRW, THEIA];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprint {
    Previous,
    Current,
    Next,
}

impl ProductLine {
    /// Milestone label of `sprint` relative to `version`, if the offset
    /// does not take the minor version below zero.
    pub fn label(&self, version: Version, sprint: Sprint) -> Option<String> {
        let offset = match sprint {
            Sprint::Previous => self.offsets[0],
            Sprint::Current => self.offsets[1],
            Sprint::Next => self.offsets[2],
        };
        let minor = u64::try_from(version.minor as i64 + offset).ok()?;
        let Version { major, patch, .. } = version;
        Some(match self.format {
            LabelFormat::MajorMinor => format!("{major}.{minor}"),
            LabelFormat::MajorMinorPatch => format!("{major}.{minor}.{patch}"),
            LabelFormat::MajorMinorPatchGa => format!("{major}.{minor}.{patch}.GA"),
        })
    }

    /// Extract the version from the fetched document.
    pub fn parse_version(&self, body: &str) -> Option<Version> {
        match self.document {
            VersionDocument::Pom { artifact } => {
                let pattern = format!(
                    r"(?s)<artifactId>{}</artifactId>.*?<version>(\d+\.\d+\.\d+)[^<]*</version>",
                    regex::escape(artifact)
                );
                let re = Regex::new(&pattern).ok()?;
                let caps = re.captures(body)?;
                Version::coerce(caps.get(1)?.as_str())
            }
            VersionDocument::PlainText => Version::coerce(&format!("{}.0", body.trim())),
            VersionDocument::PackageJson => {
                let json: serde_json::Value = serde_json::from_str(body).ok()?;
                Version::coerce(json.get("version")?.as_str()?)
            }
        }
    }
}

#[async_trait]
pub trait VersionOracle: Send + Sync {
    fn product(&self) -> &ProductLine;
    async fn previous_sprint(&self) -> Option<String>;
    async fn current_sprint(&self) -> Option<String>;
    async fn next_sprint(&self) -> Option<String>;
}

/// Fetches the product version once per run over HTTP.
pub struct VersionFetcher {
    product: ProductLine,
    client: reqwest::Client,
    version: OnceCell<Option<Version>>,
}

impl VersionFetcher {
    pub fn new(product: ProductLine) -> Self {
        Self {
            product,
            client: reqwest::Client::new(),
            version: OnceCell::new(),
        }
    }

    async fn fetch(&self) -> Result<Option<Version>> {
        let body = self
            .client
            .get(self.product.url)
            .header("User-Agent", "backlog-sync")
            .send()
            .await
            .with_context(|| format!("Failed to fetch {} version", self.product.name))?
            .error_for_status()?
            .text()
            .await?;
        Ok(self.product.parse_version(&body))
    }

    async fn version(&self) -> Option<Version> {
        *self
            .version
            .get_or_init(|| async {
                match self.fetch().await {
                    Ok(version) => {
                        debug!(product = self.product.name, ?version, "fetched version");
                        version
                    }
                    Err(e) => {
                        warn!(product = self.product.name, error = %e, "version unavailable, sprint matching disabled");
                        None
                    }
                }
            })
            .await
    }

    async fn sprint(&self, sprint: Sprint) -> Option<String> {
        let version = self.version().await?;
        self.product.label(version, sprint)
    }
}

#[async_trait]
impl VersionOracle for VersionFetcher {
    fn product(&self) -> &ProductLine {
        &self.product
    }

    async fn previous_sprint(&self) -> Option<String> {
        self.sprint(Sprint::Previous).await
    }

    async fn current_sprint(&self) -> Option<String> {
        self.sprint(Sprint::Current).await
    }

    async fn next_sprint(&self) -> Option<String> {
        self.sprint(Sprint::Next).await
    }
}

/// Sprint labels of one product line, resolved for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSprints {
    pub product: &'static str,
    pub link_prefix: Option<&'static str>,
    pub previous: Option<String>,
    pub current: Option<String>,
    pub next: Option<String>,
}

impl ProductSprints {
    pub fn label(&self, sprint: Sprint) -> Option<&str> {
        match sprint {
            Sprint::Previous => self.previous.as_deref(),
            Sprint::Current => self.current.as_deref(),
            Sprint::Next => self.next.as_deref(),
        }
        .filter(|label| !label.is_empty())
    }

    pub fn applies_to(&self, link: &str) -> bool {
        self.link_prefix.map_or(true, |prefix| link.starts_with(prefix))
    }
}

pub async fn resolve_sprints(oracles: &[Box<dyn VersionOracle>]) -> Vec<ProductSprints> {
    let mut resolved = Vec::with_capacity(oracles.len());
    for oracle in oracles {
        let product = oracle.product();
        resolved.push(ProductSprints {
            product: product.name,
            link_prefix: product.link_prefix,
            previous: oracle.previous_sprint().await,
            current: oracle.current_sprint().await,
            next: oracle.next_sprint().await,
        });
    }
    resolved
}

pub fn create_oracles() -> Vec<Box<dyn VersionOracle>> {
    PRODUCT_LINES
        .iter()
        .map(|product| Box::new(VersionFetcher::new(*product)) as Box<dyn VersionOracle>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u64, minor: u64, patch: u64) -> Version {
        Version { major, minor, patch }
    }

    #[test]
    fn coerce_fills_missing_parts() {
        assert_eq!(Version::coerce("7.42.0-SNAPSHOT"), Some(v(7, 42, 0)));
        assert_eq!(Version::coerce("v2.16"), Some(v(2, 16, 0)));
        assert_eq!(Version::coerce("1"), Some(v(1, 0, 0)));
        assert_eq!(Version::coerce("none"), None);
    }

    #[test]
    fn coerce_is_stable_across_calls() {
        for _ in 0..3 {
            assert_eq!(Version::coerce("theia 1.38.2"), Some(v(1, 38, 2)));
            assert_eq!(Version::coerce(""), None);
            assert_eq!(Version::coerce("2.5"), Some(v(2, 5, 0)));
        }
    }

    #[test]
    fn che_milestones() {
        let version = v(7, 42, 0);
        assert_eq!(CHE.label(version, Sprint::Previous).as_deref(), Some("7.41"));
        assert_eq!(CHE.label(version, Sprint::Current).as_deref(), Some("7.42"));
        assert_eq!(CHE.label(version, Sprint::Next).as_deref(), Some("7.43"));
    }

    #[test]
    fn crw_milestones() {
        let version = v(2, 16, 0);
        assert_eq!(CRW.label(version, Sprint::Previous).as_deref(), Some("2.14.0.GA"));
        assert_eq!(CRW.label(version, Sprint::Current).as_deref(), Some("2.15.0.GA"));
        assert_eq!(CRW.label(version, Sprint::Next).as_deref(), Some("2.16.0.GA"));
    }

    #[test]
    fn theia_milestones() {
        let version = v(1, 20, 0);
        assert_eq!(THEIA.label(version, Sprint::Previous).as_deref(), Some("1.20.0"));
        assert_eq!(THEIA.label(version, Sprint::Current).as_deref(), Some("1.21.0"));
        assert_eq!(THEIA.label(version, Sprint::Next).as_deref(), Some("1.22.0"));
    }

    #[test]
    fn negative_minor_has_no_label() {
        assert_eq!(CRW.label(v(3, 1, 0), Sprint::Previous), None);
        assert_eq!(CRW.label(v(3, 1, 0), Sprint::Current).as_deref(), Some("3.0.0.GA"));
    }

    #[test]
    fn parse_pom_version() {
        let pom = r#"<project>
  <parent><artifactId>che-parent</artifactId><version>7.30.0</version></parent>
  <artifactId>che-server</artifactId>
  <version>7.42.0-SNAPSHOT</version>
  <packaging>pom</packaging>
</project>"#;
        assert_eq!(CHE.parse_version(pom), Some(v(7, 42, 0)));
        assert_eq!(CHE.parse_version("<project/>"), None);
    }

    #[test]
    fn parse_plain_text_version() {
        assert_eq!(CRW.parse_version("2.16\n"), Some(v(2, 16, 0)));
    }

    #[test]
    fn parse_package_json_version() {
        assert_eq!(
            THEIA.parse_version(r#"{"name": "@theia/core", "version": "1.20.0"}"#),
            Some(v(1, 20, 0))
        );
        assert_eq!(THEIA.parse_version("not json"), None);
    }

    struct FixedOracle(ProductLine, Option<Version>);

    #[async_trait]
    impl VersionOracle for FixedOracle {
        fn product(&self) -> &ProductLine {
            &self.0
        }
        async fn previous_sprint(&self) -> Option<String> {
            self.0.label(self.1?, Sprint::Previous)
        }
        async fn current_sprint(&self) -> Option<String> {
            self.0.label(self.1?, Sprint::Current)
        }
        async fn next_sprint(&self) -> Option<String> {
            self.0.label(self.1?, Sprint::Next)
        }
    }

    #[tokio::test]
    async fn resolve_keeps_absent_versions() {
        let oracles: Vec<Box<dyn VersionOracle>> = vec![
            Box::new(FixedOracle(CHE, Some(v(7, 42, 0)))),
            Box::new(FixedOracle(THEIA, None)),
        ];
        let sprints = resolve_sprints(&oracles).await;
        assert_eq!(sprints[0].current.as_deref(), Some("7.42"));
        assert_eq!(sprints[1].product, "theia");
        assert_eq!(sprints[1].label(Sprint::Next), None);
        assert!(sprints[1].applies_to("https://github.com/eclipse-theia/theia/issues/1"));
        assert!(!sprints[1].applies_to("https://github.com/eclipse/che/issues/1"));
        assert!(sprints[0].applies_to("anything"));
    }
}
