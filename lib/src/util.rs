use std::path::Path;

use crate::error::{Chainable, Result};

/// Convert spaces to hyphens. Remove characters that aren't alphanumerics,
/// underscores, or hyphens. Convert to lowercase. Also strip leading and
/// trailing whitespace.
///
/// ```rust
/// use nbsite::util::slugify;
///
/// assert_eq!(slugify("Wave Equation (1D)"), "wave-equation-1d");
/// ```
pub fn slugify(string: &str) -> String {
    let mut output = String::with_capacity(string.len());

    let mut need_dash = false;
    for ch in string.chars() {
        for b in deunicode::deunicode_char(ch).unwrap_or("-").bytes() {
            match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' => {
                    if need_dash {
                        output.push('-');
                        need_dash = false;
                    }

                    output.push(b.to_ascii_lowercase() as char);
                }
                _ => {
                    // Every run of other characters becomes one `-`.
                    need_dash = !output.is_empty();
                }
            }
        }
    }

    output
}

/// Writes `contents` to `path`, creating missing parent directories.
pub fn write_file<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).chain_with(|| error! {
            "failed to create output directory",
            "path" => parent.display(),
        })?;
    }

    std::fs::write(path, contents).chain_with(|| error! {
        "failed to write output file",
        "path" => path.display(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Test String!!!1!1"), "my-test-string-1-1");
        assert_eq!(slugify("test\nit   now!"), "test-it-now");
        assert_eq!(slugify("  --test_-_cool- -  "), "test_-_cool");
        assert_eq!(slugify("Æúű--cool?"), "aeuu-cool");
        assert_eq!(slugify("You & Me"), "you-me");
        assert_eq!(slugify("  user@-- example.com  "), "user-example-com");
    }

    #[test]
    fn write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/page.html");
        write_file(&path, "<p>hi</p>").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<p>hi</p>");
    }
}
