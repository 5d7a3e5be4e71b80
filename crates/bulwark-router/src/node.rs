//! Radix tree node implementation.
//!
//! Each node represents one path segment. Matching tries static children
//! first, then the parameter child, then the wildcard child, and backtracks
//! out of branches that fail deeper down.

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Named parameter (e.g., "{id}", "{userId}")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static, param, or wildcard)
    pub kind: SegmentKind,

    /// Method router for this node (if it's a route endpoint)
    pub methods: Option<MethodRouter>,

    /// The pattern first registered for this endpoint
    pub pattern: Option<String>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node>>,

    /// Wildcard child (at most one per node, always a leaf)
    pub wildcard_child: Option<Box<Node>>,
}

impl Node {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            pattern: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a new static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self::with_kind(segment.into(), SegmentKind::Static)
    }

    /// Creates a new parameter node.
    #[must_use]
    pub fn new_param(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("{{{name}}}"), SegmentKind::Param(name))
    }

    /// Creates a new wildcard node.
    #[must_use]
    pub fn new_wildcard(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("*{name}"), SegmentKind::Wildcard(name))
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    /// Inserts a route into the tree.
    ///
    /// Methods registered for a path that already exists are merged into the
    /// existing endpoint.
    pub fn insert(&mut self, pattern: &str, methods: MethodRouter) -> Result<(), RouteError> {
        let segments = parse_pattern(pattern)?;
        self.insert_segments(&segments, pattern, methods)
    }

    fn insert_segments(
        &mut self,
        segments: &[(String, SegmentKind)],
        pattern: &str,
        methods: MethodRouter,
    ) -> Result<(), RouteError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            self.set_endpoint(pattern, methods);
            return Ok(());
        };

        match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(index, Node::new_static(segment));
                        index
                    }
                };
                self.static_children[index].insert_segments(remaining, pattern, methods)
            }
            SegmentKind::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new_param(name)));
                check_same_name(&child.kind, name, pattern)?;
                child.insert_segments(remaining, pattern, methods)
            }
            SegmentKind::Wildcard(name) => {
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new_wildcard(name)));
                check_same_name(&child.kind, name, pattern)?;
                child.set_endpoint(pattern, methods);
                Ok(())
            }
        }
    }

    fn set_endpoint(&mut self, pattern: &str, methods: MethodRouter) {
        match &mut self.methods {
            Some(existing) => existing.merge(methods),
            None => {
                self.methods = Some(methods);
                self.pattern = Some(pattern.to_string());
            }
        }
    }

    /// Matches a path against the tree.
    ///
    /// Returns the endpoint node and the extracted parameters.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&Node, Params)> {
        let segments: Vec<&str> = split_segments(path).collect();
        let mut params = Params::new();
        let node = self.match_segments(&segments, &mut params)?;
        Some((node, params))
    }

    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut Params) -> Option<&'a Node> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref().map(|_| self);
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(remaining, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                if child.methods.is_some() {
                    params.push(name.clone(), segments.join("/"));
                    return Some(child);
                }
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

/// Matches a single pattern against a path using the same segment rules as
/// the tree.
pub(crate) fn match_single(pattern: &str, path: &str) -> Result<Option<Params>, RouteError> {
    let expected = parse_pattern(pattern)?;
    let actual: Vec<&str> = split_segments(path).collect();
    let mut params = Params::new();

    for (index, (segment, kind)) in expected.iter().enumerate() {
        match kind {
            SegmentKind::Static => {
                if actual.get(index) != Some(&segment.as_str()) {
                    return Ok(None);
                }
            }
            SegmentKind::Param(name) => match actual.get(index) {
                Some(value) => params.push(name.clone(), *value),
                None => return Ok(None),
            },
            SegmentKind::Wildcard(name) => {
                if index >= actual.len() {
                    return Ok(None);
                }
                params.push(name.clone(), actual[index..].join("/"));
                return Ok(Some(params));
            }
        }
    }

    Ok((expected.len() == actual.len()).then_some(params))
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn parse_pattern(pattern: &str) -> Result<Vec<(String, SegmentKind)>, RouteError> {
    let segments: Vec<&str> = split_segments(pattern).collect();
    let mut parsed = Vec::with_capacity(segments.len());

    for (index, segment) in segments.iter().enumerate() {
        let kind = if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            SegmentKind::Param(name.to_string())
        } else if let Some(name) = segment.strip_prefix('*') {
            if index + 1 != segments.len() {
                return Err(RouteError::WildcardNotLast {
                    name: name.to_string(),
                    pattern: pattern.to_string(),
                });
            }
            SegmentKind::Wildcard(name.to_string())
        } else {
            SegmentKind::Static
        };

        if matches!(&kind, SegmentKind::Param(name) | SegmentKind::Wildcard(name) if name.is_empty())
        {
            return Err(RouteError::UnnamedSegment {
                pattern: pattern.to_string(),
            });
        }
        parsed.push(((*segment).to_string(), kind));
    }

    Ok(parsed)
}

fn check_same_name(existing: &SegmentKind, name: &str, pattern: &str) -> Result<(), RouteError> {
    match existing {
        SegmentKind::Param(current) | SegmentKind::Wildcard(current) if current != name => {
            Err(RouteError::ConflictingParam {
                existing: current.clone(),
                found: name.to_string(),
                pattern: pattern.to_string(),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern() {
        let segments = parse_pattern("/users/{id}/files/*rest").unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].1, SegmentKind::Static);
        assert_eq!(segments[1].1, SegmentKind::Param("id".to_string()));
        assert_eq!(segments[3].1, SegmentKind::Wildcard("rest".to_string()));
    }

    #[test]
    fn test_parse_pattern_rejects_inner_wildcard() {
        let err = parse_pattern("/a/*rest/b").unwrap_err();
        assert!(matches!(err, RouteError::WildcardNotLast { .. }));
    }

    #[test]
    fn test_parse_pattern_rejects_unnamed() {
        assert!(matches!(
            parse_pattern("/a/{}"),
            Err(RouteError::UnnamedSegment { .. })
        ));
        assert!(matches!(
            parse_pattern("/a/*"),
            Err(RouteError::UnnamedSegment { .. })
        ));
    }

    #[test]
    fn test_insert_keeps_children_sorted() {
        let mut root = Node::root();
        root.insert("/zeta", MethodRouter::new().get("z")).unwrap();
        root.insert("/alpha", MethodRouter::new().get("a")).unwrap();
        root.insert("/mid", MethodRouter::new().get("m")).unwrap();

        let names: Vec<_> = root.static_children.iter().map(|c| c.segment.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_conflicting_param_names() {
        let mut root = Node::root();
        root.insert("/users/{id}", MethodRouter::new().get("a")).unwrap();
        let err = root
            .insert("/users/{userId}/posts", MethodRouter::new().get("b"))
            .unwrap_err();
        assert!(matches!(err, RouteError::ConflictingParam { .. }));
    }

    #[test]
    fn test_match_backtracks_params() {
        let mut root = Node::root();
        root.insert("/{a}/x", MethodRouter::new().get("ax")).unwrap();
        root.insert("/{a}/{b}/y", MethodRouter::new().get("aby")).unwrap();

        let (node, params) = root.match_path("/1/2/y").unwrap();
        assert_eq!(node.pattern.as_deref(), Some("/{a}/{b}/y"));
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some("2"));
    }

    #[test]
    fn test_match_static_dead_end_falls_back_to_param() {
        let mut root = Node::root();
        root.insert("/users/me/settings", MethodRouter::new().get("settings")).unwrap();
        root.insert("/users/{id}", MethodRouter::new().get("user")).unwrap();

        let (node, params) = root.match_path("/users/me").unwrap();
        assert_eq!(node.pattern.as_deref(), Some("/users/{id}"));
        assert_eq!(params.get("id"), Some("me"));
    }

    #[test]
    fn test_wildcard_requires_a_segment() {
        let mut root = Node::root();
        root.insert("/files/*path", MethodRouter::new().get("serve")).unwrap();

        assert!(root.match_path("/files").is_none());
        let (_, params) = root.match_path("/files/a/b").unwrap();
        assert_eq!(params.get("path"), Some("a/b"));
    }

    #[test]
    fn test_endpoint_pattern_is_first_registration() {
        let mut root = Node::root();
        root.insert("/users", MethodRouter::new().get("list")).unwrap();
        root.insert("/users/", MethodRouter::new().post("create")).unwrap();

        let (node, _) = root.match_path("/users").unwrap();
        assert_eq!(node.pattern.as_deref(), Some("/users"));
        let methods = node.methods.as_ref().unwrap();
        assert_eq!(methods.allowed_methods().len(), 2);
    }

    #[test]
    fn test_match_single() {
        let params = match_single("/orders/{id}", "/orders/42").unwrap().unwrap();
        assert_eq!(params.get("id"), Some("42"));

        assert!(match_single("/orders/{id}", "/orders").unwrap().is_none());
        assert!(match_single("/orders/{id}", "/orders/42/items").unwrap().is_none());
        assert!(match_single("/orders", "/Orders").unwrap().is_none());

        let params = match_single("/static/*file", "//static/css//site.css")
            .unwrap()
            .unwrap();
        assert_eq!(params.get("file"), Some("css/site.css"));
        assert!(match_single("/static/*file", "/static").unwrap().is_none());
    }

    #[test]
    fn test_match_single_root() {
        assert!(match_single("/", "/").unwrap().is_some());
        assert!(match_single("/", "/a").unwrap().is_none());
    }
}
