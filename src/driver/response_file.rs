//! Response-file tokenizing and `@file` expansion

use hashbrown::HashSet;
use log::debug;
use std::fs;

use super::options::ArgumentError;

/// Split response-file text into arguments.
///
/// Arguments are separated by spaces. A `'` or `"` opens a quoted span that
/// runs to the matching quote or to the end of the line; the quotes themselves
/// are dropped. Lines never continue.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut args = Vec::new();

    for line in text.lines() {
        let mut current = String::new();
        let mut chars = line.chars();

        while let Some(c) = chars.next() {
            match c {
                '"' | '\'' => {
                    for inner in chars.by_ref() {
                        if inner == c {
                            break;
                        }
                        current.push(inner);
                    }
                }
                ' ' => {
                    if !current.is_empty() {
                        args.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            }
        }

        if !current.is_empty() {
            args.push(current);
        }
    }

    args
}

/// Insert `extra` in front of the first `--`, or at the end when there is none.
/// Returns the insertion index.
pub fn splice_before_separator(args: &mut Vec<String>, extra: Vec<String>) -> usize {
    let at = args.iter().position(|a| a == "--").unwrap_or(args.len());
    args.splice(at..at, extra);
    at
}

/// Read and tokenize one response file, recording it in `seen`
pub fn load(file: &str, seen: &mut HashSet<String>) -> Result<Vec<String>, ArgumentError> {
    if !seen.insert(file.to_string()) {
        return Err(ArgumentError::DuplicateResponseFile(file.to_string()));
    }

    let text = fs::read_to_string(file).map_err(|e| {
        debug!("reading response file {} failed: {}", file, e);
        ArgumentError::UnreadableResponseFile(file.to_string())
    })?;

    Ok(tokenize(&text))
}

/// Replace every `@file` token ahead of the first `--` with the file's
/// arguments. Content is spliced before the separator, so spliced `--`
/// tokens and arguments written after the user's `--` keep their place.
pub fn expand(mut args: Vec<String>, seen: &mut HashSet<String>) -> Result<Vec<String>, ArgumentError> {
    let mut i = 0;

    while i < args.len() {
        if args[i] == "--" {
            break;
        }

        let Some(file) = args[i].strip_prefix('@').map(str::to_string) else {
            i += 1;
            continue;
        };

        args.remove(i);
        let extra = load(&file, seen)?;
        debug!("response file {} expanded to {} arguments", file, extra.len());
        let at = splice_before_separator(&mut args, extra);
        i = i.min(at);
    }

    Ok(args)
}
