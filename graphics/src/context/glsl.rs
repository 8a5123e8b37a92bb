//! Lightweight GLSL inspection for the headless context.
//!
//! Evaluates the conditional directives of a composed stage and scans the
//! active lines for attribute and uniform declarations. This is not a GLSL
//! parser; full validation goes through naga when enabled.

use std::collections::HashSet;

/// Declarations found in the active part of a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StageInfo {
    /// Vertex inputs with their locations.
    pub attributes: Vec<(String, u32)>,
    /// Loose (non-block) uniforms, in declaration order.
    pub uniforms: Vec<String>,
    /// Whether a `main` entry point is present.
    pub has_main: bool,
}

struct Conditional {
    active: bool,
    parent_active: bool,
    taken: bool,
}

/// Evaluate `#define`/`#ifdef`/`#ifndef`/`#if defined`/`#else`/`#endif` and
/// `#error`, returning the active source lines.
pub(crate) fn active_lines(source: &str) -> Result<Vec<&str>, String> {
    let mut defines: HashSet<String> = HashSet::new();
    let mut stack: Vec<Conditional> = Vec::new();
    let mut lines = Vec::new();

    for (number, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        let active = stack.last().map_or(true, |c| c.active);

        let Some(directive) = trimmed.strip_prefix('#') else {
            if active {
                lines.push(line);
            }
            continue;
        };
        let mut parts = directive.trim().splitn(2, char::is_whitespace);
        let keyword = parts.next().unwrap_or_default();
        let argument = parts.next().unwrap_or_default().trim();

        match keyword {
            "define" if active => {
                if let Some(name) = argument.split_whitespace().next() {
                    defines.insert(name.to_string());
                }
            }
            "undef" if active => {
                defines.remove(argument);
            }
            "ifdef" | "ifndef" | "if" => {
                let condition = match keyword {
                    "ifdef" => defines.contains(argument),
                    "ifndef" => !defines.contains(argument),
                    _ => evaluate_if(argument, &defines),
                };
                stack.push(Conditional {
                    active: active && condition,
                    parent_active: active,
                    taken: condition,
                });
            }
            "elif" => {
                let condition = evaluate_if(argument, &defines);
                let top = stack
                    .last_mut()
                    .ok_or_else(|| format!("line {}: #elif without #if", number + 1))?;
                top.active = top.parent_active && !top.taken && condition;
                top.taken |= condition;
            }
            "else" => {
                let top = stack
                    .last_mut()
                    .ok_or_else(|| format!("line {}: #else without #if", number + 1))?;
                top.active = top.parent_active && !top.taken;
                top.taken = true;
            }
            "endif" => {
                stack
                    .pop()
                    .ok_or_else(|| format!("line {}: #endif without #if", number + 1))?;
            }
            "error" if active => {
                return Err(format!("line {}: #error {}", number + 1, argument));
            }
            "include" if active => {
                return Err(format!("line {}: unresolved include {}", number + 1, argument));
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("unterminated conditional directive".to_string());
    }
    Ok(lines)
}

fn evaluate_if(expression: &str, defines: &HashSet<String>) -> bool {
    let expression = expression.trim();
    if let Some(rest) = expression.strip_prefix('!') {
        return !evaluate_if(rest, defines);
    }
    if let Some(inner) = expression
        .strip_prefix("defined")
        .map(|rest| rest.trim().trim_start_matches('(').trim_end_matches(')').trim())
    {
        return defines.contains(inner);
    }
    match expression {
        "0" => false,
        "1" => true,
        name => defines.contains(name),
    }
}

/// Scan the active lines of a stage for declarations.
pub(crate) fn inspect(source: &str, vertex_stage: bool) -> Result<StageInfo, String> {
    let mut info = StageInfo::default();
    let mut in_block = false;
    let mut next_location = 0;

    for line in active_lines(source)? {
        let code = line.split("//").next().unwrap_or_default().trim();
        if code.is_empty() {
            continue;
        }
        if in_block {
            if code.starts_with('}') {
                in_block = false;
            }
            continue;
        }
        if code.contains("void main") {
            info.has_main = true;
        }

        let (location, declaration) = strip_layout(code);
        let mut tokens = declaration.split_whitespace();
        let qualifier = tokens.next().unwrap_or_default();

        match qualifier {
            "uniform" => {
                if declaration.contains('{') && !declaration.contains('}') {
                    in_block = true;
                    continue;
                }
                info.uniforms.extend(declared_names(declaration));
            }
            "in" | "attribute" if vertex_stage => {
                for name in declared_names(declaration) {
                    let location = location.unwrap_or(next_location);
                    next_location = location + 1;
                    info.attributes.push((name, location));
                }
            }
            _ => {}
        }
    }
    Ok(info)
}

fn strip_layout(code: &str) -> (Option<u32>, &str) {
    let Some(rest) = code.strip_prefix("layout") else {
        return (None, code);
    };
    let Some(close) = rest.find(')') else {
        return (None, code);
    };
    let qualifiers = &rest[..close];
    let location = qualifiers
        .trim_start_matches(|c: char| c == '(' || c.is_whitespace())
        .split(',')
        .filter_map(|q| q.split_once('='))
        .find(|(key, _)| key.trim() == "location")
        .and_then(|(_, value)| value.trim().parse().ok());
    (location, rest[close + 1..].trim())
}

fn declared_names(declaration: &str) -> Vec<String> {
    let Some(body) = declaration.split(';').next() else {
        return Vec::new();
    };
    // qualifier, optional precision, type, then the declarators
    let tokens: Vec<&str> = body.split_whitespace().collect();
    let skip = match tokens.get(1) {
        Some(&"lowp") | Some(&"mediump") | Some(&"highp") => 3,
        _ => 2,
    };
    tokens
        .get(skip..)
        .unwrap_or_default()
        .join(" ")
        .split(',')
        .map(|name| name.split('[').next().unwrap_or_default().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 450
#define INSTANCES
layout(location = 0) in vec3 position;
#ifdef NORMAL
layout(location = 1) in vec3 normal;
#endif
#ifdef INSTANCES
in vec4 world0;
#endif
uniform mat4 viewProjection;
uniform float weights[4], bias;
layout(set = 0, binding = 0) uniform Scene {
    mat4 view;
};
void main() {}
";

    #[test]
    fn test_inspect_vertex_stage() {
        let info = inspect(VERTEX, true).unwrap();
        assert_eq!(
            info.attributes,
            vec![("position".to_string(), 0), ("world0".to_string(), 1)]
        );
        assert_eq!(info.uniforms, vec!["viewProjection", "weights", "bias"]);
        assert!(info.has_main);
    }

    #[test]
    fn test_error_directive_in_active_branch() {
        let source = "#define HEAVY\n#ifdef HEAVY\n#error too many samplers\n#endif\n";
        let err = active_lines(source).unwrap_err();
        assert!(err.contains("too many samplers"));

        let source = "#ifdef HEAVY\n#error too many samplers\n#else\nvoid main() {}\n#endif\n";
        assert_eq!(active_lines(source).unwrap(), vec!["void main() {}"]);
    }

    #[test]
    fn test_unbalanced_conditionals() {
        assert!(active_lines("#ifdef A\n").is_err());
        assert!(active_lines("#endif\n").is_err());
    }

    #[test]
    fn test_if_defined() {
        let source = "#define A\n#if defined(A)\nkeep\n#elif defined(B)\ndrop\n#endif\n";
        assert_eq!(active_lines(source).unwrap(), vec!["keep"]);
    }
}
