//! Static file serving for the local server

use std::path::{Component, Path, PathBuf};
use log::{debug, trace};

pub const NOT_FOUND: &str = "Not Found";
const OCTET_STREAM: &str = "application/octet-stream";

/// A file ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile
{   pub content_type: String
  , pub bytes: Vec<u8>
}

/// Map a URL path to a file under `root`.
///
/// The path is percent-decoded, `/` maps to `index.html`, and the result
/// is normalized lexically. Returns `None` when the path is malformed or
/// would leave `root`.
pub fn resolve_safe_path(root: &Path, url_path: &str) -> Option<PathBuf>
{   let path = url_path.split('?').next().unwrap_or("");
    let decoded = urlencoding::decode(path).ok()?;
    let relative = if decoded == "/"
    {   "index.html"
    } else
    {   decoded.trim_start_matches('/')
    };

    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components()
    {   match component
        {   Component::Normal(part) => resolved.push(part)
          , Component::CurDir => {}
          , Component::ParentDir => {
              if !resolved.pop()
              {   return None;
              }
            }
          , Component::RootDir | Component::Prefix(_) => return None
        }
    }

    if !resolved.starts_with(root)
    {   debug!("Rejected path outside root: {}", url_path);
        return None;
    }
    Some(resolved)
}

/// Content type from the file extension
pub fn content_type(path: &Path) -> String
{   match mime_guess::from_path(path).first()
    {   Some(mime) => {
          let textual = mime.type_() == mime_guess::mime::TEXT
            || mime.subtype() == mime_guess::mime::JSON
            || mime.subtype() == mime_guess::mime::JAVASCRIPT;
          if textual
          {   format!("{}; charset=utf-8", mime.essence_str())
          } else
          {   mime.essence_str().to_string()
          }
        }
      , None => OCTET_STREAM.to_string()
    }
}

/// Read a static file. `None` means "answer 404".
pub async fn load(root: &Path, url_path: &str) -> Option<StaticFile>
{   let path = resolve_safe_path(root, url_path)?;
    let metadata = tokio::fs::metadata(&path).await.ok()?;
    if metadata.is_dir()
    {   trace!("Path is a directory: {}", path.display());
        return None;
    }

    let bytes = tokio::fs::read(&path).await.ok()?;
    trace!("Serving {} ({} bytes)", path.display(), bytes.len());
    Some(StaticFile
    {   content_type: content_type(&path)
      , bytes
    })
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn root_maps_to_index()
    {   let root = Path::new("/srv/site");
        assert_eq!(
          resolve_safe_path(root, "/"),
          Some(PathBuf::from("/srv/site/index.html"))
        );
        assert_eq!(
          resolve_safe_path(root, "/css/app.css?v=3"),
          Some(PathBuf::from("/srv/site/css/app.css"))
        );
    }

    #[test]
    fn traversal_is_rejected()
    {   let root = Path::new("/srv/site");
        assert_eq!(resolve_safe_path(root, "/../etc/passwd"), None);
        assert_eq!(resolve_safe_path(root, "/%2e%2e/%2e%2e/etc/passwd"), None);
        assert_eq!(
          resolve_safe_path(root, "/a/../b.txt"),
          Some(PathBuf::from("/srv/site/b.txt"))
        );
    }

    #[test]
    fn decodes_percent_escapes()
    {   let root = Path::new("/srv/site");
        assert_eq!(
          resolve_safe_path(root, "/my%20file.txt"),
          Some(PathBuf::from("/srv/site/my file.txt"))
        );
    }

    #[test]
    fn load_reads_files_but_not_directories()
    {   let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.json"), b"{}").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let file = tokio_test::block_on(load(dir.path(), "/data.json")).unwrap();
        assert_eq!(file.content_type, "application/json; charset=utf-8");
        assert_eq!(file.bytes, b"{}");

        assert_eq!(tokio_test::block_on(load(dir.path(), "/sub")), None);
        assert_eq!(tokio_test::block_on(load(dir.path(), "/nope.txt")), None);
    }

    #[test]
    fn content_types_by_extension()
    {   assert_eq!(content_type(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("a.css")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("a.json")), "application/json; charset=utf-8");
        assert_eq!(content_type(Path::new("a.png")), "image/png");
        assert_eq!(content_type(Path::new("a.unknownext")), "application/octet-stream");
    }
}
