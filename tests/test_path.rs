use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tinyweb::http::error::HttpError;
use tinyweb::routing::PathResolver;

/// `<tmp>/htdocs` as document root, with `<tmp>/secret` next to it.
fn site() -> (TempDir, PathResolver) {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("htdocs");
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::write(root.join("index.html"), "<h1>Index</h1>\n").unwrap();
    fs::write(root.join("foo.txt"), "foo").unwrap();
    fs::write(root.join("docs/index.html"), "docs").unwrap();
    fs::write(root.join("docs/a b.txt"), "space").unwrap();
    fs::write(tmp.path().join("secret"), "secret").unwrap();

    let resolver = PathResolver::new(&root).unwrap();
    (tmp, resolver)
}

fn resolved(resolver: &PathResolver, uri: &str) -> Result<String, HttpError> {
    resolver
        .resolve(uri)
        .map(|p| fs::read_to_string(p.as_path()).unwrap())
}

#[test]
fn test_resolve_existing_file() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "/foo.txt"), Ok("foo".to_string()));
}

#[test]
fn test_resolve_root_serves_index() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "/"), Ok("<h1>Index</h1>\n".to_string()));
}

#[test]
fn test_resolve_subdirectory_serves_index() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "/docs"), Ok("docs".to_string()));
    assert_eq!(resolved(&resolver, "/docs/"), Ok("docs".to_string()));
}

#[test]
fn test_resolve_percent_decodes() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "/docs/a%20b.txt"), Ok("space".to_string()));
}

#[test]
fn test_resolve_ignores_query() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "/foo.txt?v=1"), Ok("foo".to_string()));
}

#[test]
fn test_resolve_dot_segments_inside_root() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "/docs/../foo.txt"), Ok("foo".to_string()));
    assert_eq!(resolved(&resolver, "/./foo.txt"), Ok("foo".to_string()));
}

#[test]
fn test_resolve_result_is_inside_root() {
    let (_tmp, resolver) = site();
    let path = resolver.resolve("/foo.txt").unwrap();
    assert!(path.as_path().starts_with(resolver.root()));
}

#[test]
fn test_resolve_missing_file_is_not_found() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "/nonexistent"), Err(HttpError::NotFound));
    assert_eq!(resolved(&resolver, "/docs/missing/deeper"), Err(HttpError::NotFound));
}

#[test]
fn test_resolve_requires_leading_slash() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "foo.txt"), Err(HttpError::BadRequest));
    assert_eq!(resolved(&resolver, ""), Err(HttpError::BadRequest));
    assert_eq!(resolved(&resolver, "*"), Err(HttpError::BadRequest));
}

#[test]
fn test_resolve_malformed_uri_is_bad_request() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "/%:"), Err(HttpError::BadRequest));
    assert_eq!(resolved(&resolver, "/%ff"), Err(HttpError::BadRequest));
    assert_eq!(resolved(&resolver, "/a%00b"), Err(HttpError::BadRequest));
}

#[test]
fn test_traversal_to_existing_file_is_forbidden() {
    let (_tmp, resolver) = site();
    for uri in ["/../secret", "/%2e%2e/secret", "/.%2e/secret", "/%2e./secret", "/docs/../../secret"] {
        assert_eq!(resolved(&resolver, uri), Err(HttpError::Forbidden), "{}", uri);
    }
}

#[test]
fn test_traversal_to_missing_file_is_forbidden() {
    let (_tmp, resolver) = site();
    for uri in ["/../nonexistent", "/%2e%2e/nonexistent", "/.%2e/nonexistent", "/%2e./nonexistent"] {
        assert_eq!(resolved(&resolver, uri), Err(HttpError::Forbidden), "{}", uri);
    }
}

#[test]
fn test_traversal_with_encoded_separator_is_forbidden() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "/%2e%2e%2fsecret"), Err(HttpError::Forbidden));
    assert_eq!(resolved(&resolver, "/docs/%2e%2e%2f%2e%2e%2fsecret"), Err(HttpError::Forbidden));
}

#[test]
fn test_parent_of_root_is_forbidden() {
    let (_tmp, resolver) = site();
    assert_eq!(resolved(&resolver, "/.."), Err(HttpError::Forbidden));
    assert_eq!(resolved(&resolver, "/%2e%2e"), Err(HttpError::Forbidden));
}

#[cfg(unix)]
#[test]
fn test_symlink_out_of_root_is_forbidden() {
    let (tmp, resolver) = site();
    let root = tmp.path().join("htdocs");
    std::os::unix::fs::symlink(tmp.path(), root.join("escape")).unwrap();
    std::os::unix::fs::symlink(tmp.path().join("secret"), root.join("secret-link")).unwrap();

    assert_eq!(resolved(&resolver, "/escape/secret"), Err(HttpError::Forbidden));
    assert_eq!(resolved(&resolver, "/escape/nonexistent"), Err(HttpError::Forbidden));
    assert_eq!(resolved(&resolver, "/secret-link"), Err(HttpError::Forbidden));
}

#[cfg(unix)]
#[test]
fn test_symlink_inside_root_is_allowed() {
    let (tmp, resolver) = site();
    let root = tmp.path().join("htdocs");
    std::os::unix::fs::symlink(root.join("foo.txt"), root.join("bar.txt")).unwrap();

    assert_eq!(resolved(&resolver, "/bar.txt"), Ok("foo".to_string()));
}

#[test]
fn test_document_root_must_exist() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("file");
    fs::write(&file, "not a directory").unwrap();

    assert!(PathResolver::new(tmp.path().join("missing")).is_err());
    assert!(PathResolver::new(Path::new(&file)).is_err());
}
