//! Execution ordering for chained requests.
//!
//! The parser records which named requests each request depends on but keeps
//! requests in document order. [`execution_order`] derives an order in which
//! every dependency runs before its dependents.

use crate::models::HttpFile;
use log::debug;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The `depends_on` edges form a cycle; `path` lists the request labels
    /// along it, starting and ending with the same request.
    #[error("dependency cycle: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Returns request indices with dependencies first.
///
/// Requests are visited in document order and each is preceded by its
/// not-yet-scheduled dependencies, so files without dependencies keep their
/// original order. Dependencies on names that no request declares are
/// ignored.
///
/// # Examples
///
/// ```
/// use restfile::graph::execution_order;
/// use restfile::parser::parse;
///
/// let content = "GET https://a.example.com/{{login.response.body.$.id}}\n\n###\n# @name login\nPOST https://a.example.com/login\n";
/// let file = parse(content, "chain.http").unwrap();
/// assert_eq!(execution_order(&file).unwrap(), vec![1, 0]);
/// ```
pub fn execution_order(file: &HttpFile) -> Result<Vec<usize>, OrderError> {
    // First declaration wins, as in `HttpFile::request_index`.
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for (index, request) in file.requests.iter().enumerate() {
        if let Some(name) = &request.name {
            by_name.entry(name.to_ascii_lowercase()).or_insert(index);
        }
    }

    let mut marks = vec![Mark::Unvisited; file.requests.len()];
    let mut order = Vec::with_capacity(file.requests.len());

    for index in 0..file.requests.len() {
        visit(file, &by_name, index, &mut marks, &mut order)?;
    }

    debug!("execution order for {}: {:?}", file.path.display(), order);
    Ok(order)
}

/// Depth-first walk from `root` using an explicit stack of
/// `(request, next dependency position)` frames.
fn visit(
    file: &HttpFile,
    by_name: &HashMap<String, usize>,
    root: usize,
    marks: &mut [Mark],
    order: &mut Vec<usize>,
) -> Result<(), OrderError> {
    if marks[root] == Mark::Done {
        return Ok(());
    }
    marks[root] = Mark::Visiting;
    let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

    while let Some(frame) = stack.last_mut() {
        let (index, position) = *frame;
        let Some(name) = file.requests[index].depends_on.get(position) else {
            stack.pop();
            marks[index] = Mark::Done;
            order.push(index);
            continue;
        };
        frame.1 += 1;

        let Some(&dependency) = by_name.get(&name.to_ascii_lowercase()) else {
            continue;
        };
        match marks[dependency] {
            Mark::Done => {}
            Mark::Visiting => {
                let start = stack
                    .iter()
                    .position(|&(i, _)| i == dependency)
                    .unwrap_or(0);
                let mut path: Vec<String> = stack[start..]
                    .iter()
                    .map(|&(i, _)| file.requests[i].display_name())
                    .collect();
                path.push(file.requests[dependency].display_name());
                return Err(OrderError::Cycle { path });
            }
            Mark::Unvisited => {
                marks[dependency] = Mark::Visiting;
                stack.push((dependency, 0));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_no_dependencies_keeps_document_order() {
        let file = parse(
            "GET https://a.example.com/1\n###\nGET https://a.example.com/2\n###\nGET https://a.example.com/3\n",
            "t.http",
        )
        .unwrap();
        assert_eq!(execution_order(&file).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_dependencies_first() {
        let content = "\
# @name profile
GET https://a.example.com/me
Authorization: Bearer {{login.response.body.$.token}}

###
# @name health
GET https://a.example.com/health

###
# @name login
POST https://a.example.com/login
";
        let file = parse(content, "t.http").unwrap();
        assert_eq!(execution_order(&file).unwrap(), vec![2, 0, 1]);
    }

    #[test]
    fn test_unknown_dependency_ignored() {
        let file = parse("GET https://a.example.com/{{ghost.response.body.$.id}}\n", "t.http").unwrap();
        assert_eq!(execution_order(&file).unwrap(), vec![0]);
    }

    #[test]
    fn test_cycle_detected() {
        let content = "\
# @name a
GET https://x.example.com/{{b.response.body.$.id}}

###
# @name b
GET https://x.example.com/{{a.response.body.$.id}}
";
        let file = parse(content, "t.http").unwrap();
        let err = execution_order(&file).unwrap_err();
        assert_eq!(
            err,
            OrderError::Cycle {
                path: vec!["a".to_string(), "b".to_string(), "a".to_string()]
            }
        );
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let content = "# @name poll\nGET https://x.example.com/{{poll.response.headers.Next}}\n";
        let file = parse(content, "t.http").unwrap();
        assert!(matches!(execution_order(&file), Err(OrderError::Cycle { .. })));
    }

    #[test]
    fn test_long_chain_ordered() {
        let count = 20_000;
        let mut content = String::from("# @name r0\nGET https://a.example.com/0\n");
        for i in 1..count {
            content.push_str(&format!(
                "\n###\n# @name r{i}\nGET https://a.example.com/{{{{r{}.response.body.$.id}}}}\n",
                i - 1
            ));
        }
        let file = parse(&content, "chain.http").unwrap();
        assert_eq!(file.requests.len(), count);

        let order = execution_order(&file).unwrap();
        assert_eq!(order, (0..count).collect::<Vec<_>>());
    }

    #[test]
    fn test_long_reverse_chain_ordered() {
        let count = 20_000;
        let mut content = String::new();
        for i in 0..count {
            content.push_str(&format!(
                "# @name r{i}\nGET https://a.example.com/{{{{r{}.response.body.$.id}}}}\n\n###\n",
                i + 1
            ));
        }
        content.push_str(&format!("# @name r{count}\nGET https://a.example.com/end\n"));
        let file = parse(&content, "chain.http").unwrap();

        let order = execution_order(&file).unwrap();
        assert_eq!(order.len(), count + 1);
        assert_eq!(order[0], count);
        assert_eq!(order[count], 0);
    }
}
