use super::error::VfsError;

/// Resolves a client-supplied path against the session's working directory
/// into a normalised absolute virtual path.
///
/// `..` components pop; a pop past the virtual root is an escape attempt and
/// fails, leaving the caller's state untouched. The returned path always
/// starts with `/` and never contains `.` or `..`.
pub fn resolve_virtual(cwd: &str, arg: &str) -> Result<String, VfsError> {
    let joined = if arg.starts_with('/') {
        arg.to_string()
    } else if arg.is_empty() {
        cwd.to_string()
    } else if cwd.ends_with('/') {
        format!("{}{}", cwd, arg)
    } else {
        format!("{}/{}", cwd, arg)
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in joined.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(VfsError::Permission(arg.to_string()));
                }
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        Ok(String::from("/"))
    } else {
        Ok(format!("/{}", parts.join("/")))
    }
}

/// The last component of a virtual path, for listings and STOU replies.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The parent of a virtual path; `/` is its own parent.
pub fn parent(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => String::from("/"),
        Some(pos) => path[..pos].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_cwd() {
        assert_eq!(resolve_virtual("/", "file.txt").unwrap(), "/file.txt");
        assert_eq!(resolve_virtual("/a/b", "c.txt").unwrap(), "/a/b/c.txt");
        assert_eq!(resolve_virtual("/a/b", "../c").unwrap(), "/a/c");
    }

    #[test]
    fn absolute_paths_ignore_cwd() {
        assert_eq!(resolve_virtual("/a/b", "/x/y").unwrap(), "/x/y");
    }

    #[test]
    fn dot_components_collapse() {
        assert_eq!(resolve_virtual("/", "./a/./b").unwrap(), "/a/b");
        assert_eq!(resolve_virtual("/a", "").unwrap(), "/a");
    }

    #[test]
    fn escape_attempts_fail() {
        assert!(resolve_virtual("/", "..").is_err());
        assert!(resolve_virtual("/", "../etc/passwd").is_err());
        assert!(resolve_virtual("/a", "../../b").is_err());
        // Up to the root and back down is fine.
        assert_eq!(resolve_virtual("/a/b", "../../c").unwrap(), "/c");
    }

    #[test]
    fn helpers_split_paths() {
        assert_eq!(base_name("/a/b/c.txt"), "c.txt");
        assert_eq!(parent("/a/b/c.txt"), "/a/b");
        assert_eq!(parent("/c.txt"), "/");
        assert_eq!(parent("/"), "/");
    }
}
