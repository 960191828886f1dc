//! Root filesystem resolution.
//!
//! Units name their base filesystem with a URI. Two schemes address stacks
//! preloaded on the cell and must be mapped to a concrete path; every other
//! scheme is handed to the runtime untouched.
//!
//! ```text
//! preloaded:cflinuxfs4               -> /var/stacks/cflinuxfs4
//! preloaded+layer:cflinuxfs4?layer=x -> preloaded+layer:/var/stacks/cflinuxfs4?layer=x
//! docker:///library/busybox          -> docker:///library/busybox
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Scheme for stacks preloaded on the cell.
pub const PRELOADED_ROOTFS_SCHEME: &str = "preloaded";

/// Scheme for preloaded stacks consumed as image layers. The query string
/// carries layer parameters and survives resolution.
pub const PRELOADED_OCI_ROOTFS_SCHEME: &str = "preloaded+layer";

/// Stack name → concrete path on this cell.
pub type StackPathMap = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum RootFsError {
    #[error("preloaded rootfs path not found: {0}")]
    NotFound(String),
    #[error("invalid control character in rootfs uri {0:?}")]
    ControlCharacter(String),
    #[error("invalid rootfs uri {uri}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

/// Resolve a root filesystem reference to the value the runtime understands.
///
/// An empty reference resolves to itself. Pure and deterministic.
pub fn path_for_root_fs(
    root_fs: &str,
    stack_path_map: &StackPathMap,
) -> Result<String, RootFsError> {
    if root_fs.is_empty() {
        return Ok(String::new());
    }
    // The URL parser strips tabs and newlines instead of rejecting them.
    if root_fs.chars().any(|c| c.is_ascii_control()) {
        return Err(RootFsError::ControlCharacter(root_fs.to_string()));
    }

    let url = match Url::parse(root_fs) {
        Ok(url) => url,
        // Plain paths have no scheme and are already concrete.
        Err(url::ParseError::RelativeUrlWithoutBase) => return Ok(root_fs.to_string()),
        Err(source) => {
            return Err(RootFsError::InvalidUri {
                uri: root_fs.to_string(),
                source,
            });
        }
    };

    match url.scheme() {
        PRELOADED_ROOTFS_SCHEME => lookup_stack(&url, stack_path_map).map(str::to_string),
        PRELOADED_OCI_ROOTFS_SCHEME => {
            let path = lookup_stack(&url, stack_path_map)?;
            Ok(format!("{}:{}?{}", PRELOADED_OCI_ROOTFS_SCHEME, path, raw_query(root_fs)))
        }
        _ => Ok(root_fs.to_string()),
    }
}

/// Query exactly as written. `Url::query` re-encodes it.
fn raw_query(root_fs: &str) -> &str {
    root_fs
        .split_once('?')
        .map(|(_, rest)| rest.split_once('#').map_or(rest, |(query, _)| query))
        .unwrap_or_default()
}

fn lookup_stack<'a>(url: &Url, stack_path_map: &'a StackPathMap) -> Result<&'a str, RootFsError> {
    let stack = url.path();
    stack_path_map
        .get(stack)
        .map(String::as_str)
        .ok_or_else(|| RootFsError::NotFound(stack.to_string()))
}

/// What a cell can do for a given rootfs scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RootFsProvider {
    /// Any value is accepted; the runtime fetches it.
    Arbitrary,
    /// Only the listed stacks are available.
    FixedSet { stacks: BTreeSet<String> },
}

impl RootFsProvider {
    pub fn fixed_set<I, S>(stacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RootFsProvider::FixedSet {
            stacks: stacks.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, url: &Url) -> bool {
        match self {
            RootFsProvider::Arbitrary => true,
            RootFsProvider::FixedSet { stacks } => stacks.contains(url.path()),
        }
    }
}

/// Scheme → provider, advertised in every cell snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootFsProviders(BTreeMap<String, RootFsProvider>);

impl RootFsProviders {
    /// Build providers from the preloaded stacks and the arbitrary schemes
    /// this cell supports. Both preloaded schemes expose the same stacks.
    pub fn new<I, S>(preloaded: &StackPathMap, arbitrary_schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut providers = BTreeMap::new();
        for scheme in arbitrary_schemes {
            providers.insert(scheme.into(), RootFsProvider::Arbitrary);
        }

        let stacks = RootFsProvider::fixed_set(preloaded.keys().cloned());
        providers.insert(PRELOADED_ROOTFS_SCHEME.to_string(), stacks.clone());
        providers.insert(PRELOADED_OCI_ROOTFS_SCHEME.to_string(), stacks);

        Self(providers)
    }

    pub fn get(&self, scheme: &str) -> Option<&RootFsProvider> {
        self.0.get(scheme)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this cell could serve the given rootfs reference.
    pub fn match_root_fs(&self, root_fs: &str) -> bool {
        let Ok(url) = Url::parse(root_fs) else {
            return false;
        };
        self.0
            .get(url.scheme())
            .is_some_and(|provider| provider.matches(&url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stacks() -> StackPathMap {
        let mut m = StackPathMap::new();
        m.insert("stack-a".to_string(), "/var/stacks/a".to_string());
        m.insert("stack-b".to_string(), "/var/stacks/b".to_string());
        m
    }

    #[test]
    fn empty_reference_resolves_to_itself() {
        assert_eq!(path_for_root_fs("", &stacks()).unwrap(), "");
    }

    #[test]
    fn preloaded_scheme_maps_to_stack_path() {
        let path = path_for_root_fs("preloaded:stack-a", &stacks()).unwrap();
        assert_eq!(path, "/var/stacks/a");
    }

    #[test]
    fn preloaded_scheme_drops_query() {
        let path = path_for_root_fs("preloaded:stack-b?foo=bar", &stacks()).unwrap();
        assert_eq!(path, "/var/stacks/b");
    }

    #[test]
    fn preloaded_layer_scheme_keeps_query() {
        let root_fs = "preloaded+layer:stack-a?layer=https://blob/layer.tgz";
        let path = path_for_root_fs(root_fs, &stacks()).unwrap();
        assert_eq!(path, "preloaded+layer:/var/stacks/a?layer=https://blob/layer.tgz");
    }

    #[test]
    fn preloaded_layer_query_is_not_reencoded() {
        let root_fs = "preloaded+layer:stack-a?layer=a b&x=\"q\"<1>#frag";
        let path = path_for_root_fs(root_fs, &stacks()).unwrap();
        assert_eq!(path, "preloaded+layer:/var/stacks/a?layer=a b&x=\"q\"<1>");
    }

    #[test]
    fn preloaded_layer_without_query_keeps_separator() {
        let path = path_for_root_fs("preloaded+layer:stack-b", &stacks()).unwrap();
        assert_eq!(path, "preloaded+layer:/var/stacks/b?");
    }

    #[test]
    fn control_characters_are_rejected() {
        let uris = [
            "preloaded:stack-a\n",
            "preloaded:\tstack-a",
            "/var/stacks/a\r",
            "docker:///busy\u{7f}box",
        ];
        for uri in uris {
            let err = path_for_root_fs(uri, &stacks()).unwrap_err();
            assert!(matches!(err, RootFsError::ControlCharacter(_)), "{uri:?}");
        }
    }

    #[test]
    fn unknown_stack_is_not_found() {
        for uri in ["preloaded:missing", "preloaded+layer:missing?x=y"] {
            let err = path_for_root_fs(uri, &stacks()).unwrap_err();
            assert!(matches!(err, RootFsError::NotFound(ref s) if s == "missing"), "{uri}");
        }
    }

    #[test]
    fn unknown_stack_fails_with_empty_map() {
        let err = path_for_root_fs("preloaded:stack-a", &StackPathMap::new()).unwrap_err();
        assert!(matches!(err, RootFsError::NotFound(_)));
    }

    #[test]
    fn other_schemes_pass_through() {
        let uri = "docker:///cloudfoundry/grace#latest";
        assert_eq!(path_for_root_fs(uri, &stacks()).unwrap(), uri);
    }

    #[test]
    fn concrete_paths_are_idempotent() {
        for uri in ["/var/stacks/a", "docker:///busybox", "https://example.com/rootfs.tar"] {
            let once = path_for_root_fs(uri, &stacks()).unwrap();
            assert_eq!(once, uri);
            assert_eq!(path_for_root_fs(&once, &stacks()).unwrap(), once);
        }
    }

    #[test]
    fn providers_register_both_preloaded_schemes() {
        let providers = RootFsProviders::new(&stacks(), ["docker"]);

        assert_eq!(providers.len(), 3);
        assert_eq!(providers.get("docker"), Some(&RootFsProvider::Arbitrary));
        let expected = RootFsProvider::fixed_set(["stack-a", "stack-b"]);
        assert_eq!(providers.get(PRELOADED_ROOTFS_SCHEME), Some(&expected));
        assert_eq!(providers.get(PRELOADED_OCI_ROOTFS_SCHEME), Some(&expected));
    }

    #[test]
    fn providers_match_root_fs() {
        let providers = RootFsProviders::new(&stacks(), ["docker"]);

        assert!(providers.match_root_fs("preloaded:stack-a"));
        assert!(providers.match_root_fs("preloaded+layer:stack-b?x=1"));
        assert!(providers.match_root_fs("docker:///busybox"));
        assert!(!providers.match_root_fs("preloaded:stack-c"));
        assert!(!providers.match_root_fs("oci://registry/image"));
        assert!(!providers.match_root_fs("not a uri"));
    }

    #[test]
    fn providers_serialize_by_scheme() {
        let providers = RootFsProviders::new(&stacks(), ["docker"]);
        let json = serde_json::to_value(&providers).unwrap();

        assert_eq!(json["docker"]["type"], "arbitrary");
        assert_eq!(json["preloaded"]["type"], "fixed_set");
        assert_eq!(json["preloaded"]["stacks"][0], "stack-a");
    }
}
