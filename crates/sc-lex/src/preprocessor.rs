//! Textual `#include` / `#define` / `#undef` expansion over one root file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("{file}:{line}: invalid #include directive")]
    InvalidInclude { file: String, line: u32 },

    #[error("{file}:{line}: include file not found: {target}")]
    IncludeNotFound {
        file: String,
        line: u32,
        target: String,
    },

    #[error("{file}:{line}: circular include: {target}")]
    CircularInclude {
        file: String,
        line: u32,
        target: String,
    },

    #[error("{file}:{line}: #define missing a macro name")]
    DefineMissingName { file: String, line: u32 },

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Expands includes and macros starting from `root_path`, returning one
/// flat source string ready for the lexer.
pub fn preprocess(root_path: &Path) -> Result<String, PreprocessError> {
    let base_dir = root_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut pp = Preprocessor {
        base_dir,
        active: Vec::new(),
        macros: HashMap::new(),
    };
    let lines = pp.expand_file(root_path)?;
    Ok(lines.join("\n"))
}

struct Preprocessor {
    base_dir: PathBuf,
    active: Vec<PathBuf>,
    macros: HashMap<String, String>,
}

impl Preprocessor {
    fn expand_file(&mut self, path: &Path) -> Result<Vec<String>, PreprocessError> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let display_name = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|source| PreprocessError::Io {
            path: display_name.clone(),
            source,
        })?;

        self.active.push(canonical);
        let dir = path.parent().map(Path::to_path_buf);

        let mut out = Vec::new();
        for (idx, raw_line) in content.lines().enumerate() {
            let line_no = idx as u32 + 1;
            let trimmed = raw_line.trim();

            if let Some(rest) = trimmed.strip_prefix("#include") {
                let target = parse_include_target(rest).ok_or_else(|| {
                    PreprocessError::InvalidInclude {
                        file: display_name.clone(),
                        line: line_no,
                    }
                })?;
                let resolved = self
                    .resolve_include(&target, dir.as_deref())
                    .ok_or_else(|| PreprocessError::IncludeNotFound {
                        file: display_name.clone(),
                        line: line_no,
                        target: target.clone(),
                    })?;
                let resolved_canonical = resolved
                    .canonicalize()
                    .unwrap_or_else(|_| resolved.clone());
                if self.active.contains(&resolved_canonical) {
                    return Err(PreprocessError::CircularInclude {
                        file: display_name.clone(),
                        line: line_no,
                        target,
                    });
                }
                out.push(format!("// Included from: {target}"));
                out.extend(self.expand_file(&resolved)?);
                out.push(format!("// End include: {target}"));
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("#define") {
                let rest = rest.trim_start();
                let (name, value) = split_define(rest);
                let name =
                    name.filter(|n| is_ident(n))
                        .ok_or_else(|| PreprocessError::DefineMissingName {
                            file: display_name.clone(),
                            line: line_no,
                        })?;
                self.macros.insert(name.to_string(), value.to_string());
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("#undef") {
                let name = rest.trim();
                self.macros.remove(name);
                continue;
            }

            out.push(expand_macros(raw_line, &self.macros));
        }

        self.active.pop();
        Ok(out)
    }

    fn resolve_include(&self, target: &str, including_dir: Option<&Path>) -> Option<PathBuf> {
        let candidates = [
            including_dir.map(|d| d.join(target)),
            Some(self.base_dir.join(target)),
            Some(PathBuf::from(target)),
        ];
        candidates.into_iter().flatten().find(|p| p.exists())
    }
}

fn parse_include_target(rest: &str) -> Option<String> {
    let rest = rest.trim();
    if rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
        return Some(rest[1..rest.len() - 1].to_string());
    }
    if rest.len() >= 2 && rest.starts_with('<') && rest.ends_with('>') {
        return Some(rest[1..rest.len() - 1].to_string());
    }
    None
}

fn split_define(rest: &str) -> (Option<&str>, &str) {
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| c.is_whitespace())
        .unwrap_or(rest.len());
    let name = &rest[..end];
    let value = rest[end..].trim();
    if name.is_empty() {
        (None, "")
    } else {
        (Some(name), value)
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Expands macro uses in `line` by whole-word substitution, re-scanning the
/// result until a fixed point so chained macros (`#define A B` / `#define B
/// 100`) resolve fully.
fn expand_macros(line: &str, macros: &HashMap<String, String>) -> String {
    if macros.is_empty() {
        return line.to_string();
    }
    let mut current = line.to_string();
    loop {
        let next = expand_macros_once(&current, macros);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn expand_macros_once(line: &str, macros: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(line.len());
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '_' || c.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let boundary_ok = (start == 0 || !is_ident_char(chars[start - 1]))
                && (i == chars.len() || !is_ident_char(chars[i]));
            if boundary_ok {
                if let Some(replacement) = macros.get(&word) {
                    out.push_str(replacement);
                    continue;
                }
            }
            out.push_str(&word);
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn idempotent_with_no_directives() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "main.sc", "function main() { return 0; }");
        let out = preprocess(&path).unwrap();
        assert_eq!(out, "function main() { return 0; }");
    }

    #[test]
    fn chained_define_resolves_at_expansion_time() {
        let dir = tempdir().unwrap();
        let path = write(
            dir.path(),
            "main.sc",
            "#define A B\n#define B 100\nfunction main() { return A; }",
        );
        let out = preprocess(&path).unwrap();
        assert_eq!(out.trim(), "function main() { return 100; }");
    }

    #[test]
    fn undef_of_unknown_name_is_not_an_error() {
        let dir = tempdir().unwrap();
        let path = write(dir.path(), "main.sc", "#undef NEVER_DEFINED\nuint32 x;");
        let out = preprocess(&path).unwrap();
        assert_eq!(out.trim(), "uint32 x;");
    }

    #[test]
    fn circular_include_is_detected() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.sc", "#include \"b.sc\"\n");
        write(dir.path(), "b.sc", "#include \"a.sc\"\n");
        let a = dir.path().join("a.sc");
        let err = preprocess(&a).unwrap_err();
        assert!(matches!(err, PreprocessError::CircularInclude { .. }));
    }

    #[test]
    fn include_wraps_content_in_bookkeeping_comments() {
        let dir = tempdir().unwrap();
        write(dir.path(), "lib.sc", "uint32 shared;");
        let main = write(dir.path(), "main.sc", "#include \"lib.sc\"\n");
        let out = preprocess(&main).unwrap();
        assert!(out.contains("// Included from: lib.sc"));
        assert!(out.contains("uint32 shared;"));
        assert!(out.contains("// End include: lib.sc"));
    }

    #[test]
    fn missing_include_reports_not_found() {
        let dir = tempdir().unwrap();
        let main = write(dir.path(), "main.sc", "#include \"nope.sc\"\n");
        let err = preprocess(&main).unwrap_err();
        assert!(matches!(err, PreprocessError::IncludeNotFound { .. }));
    }
}
