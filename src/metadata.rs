//! Tags, properties and names carried in description lines.
//!
//! A description line starting with `tags:` lists whitespace-separated
//! tags; one starting with `properties:` lists properties such as `top` or
//! `bottom`. The first line of a description is the entity's name, with
//! literal `\n` sequences standing for line breaks.

use crate::graph::{Graph, NodeNum, SeqNum, Step};
use std::collections::{BTreeMap, BTreeSet};

const TAGS_DECL: &str = "tags:";
const PROPERTIES_DECL: &str = "properties:";

fn words_after<'a>(desc: &'a [String], decl: &'a str) -> impl Iterator<Item = String> + 'a {
    desc.iter()
        .filter_map(move |line| line.strip_prefix(decl))
        .flat_map(str::split_whitespace)
        .map(str::to_owned)
}

pub fn tags_in_desc(desc: &[String]) -> BTreeSet<String> {
    words_after(desc, TAGS_DECL).collect()
}

pub fn properties_in_desc(desc: &[String]) -> BTreeSet<String> {
    words_after(desc, PROPERTIES_DECL).collect()
}

/// Display name from a description's first line.
pub fn name_of(desc: &[String]) -> Option<String> {
    desc.first().map(|line| line.replace("\\n", " "))
}

/// Every tag used anywhere in the graph.
pub fn all_tags(graph: &Graph) -> BTreeSet<String> {
    let nodes = graph.nodenums().flat_map(|n| tags_in_desc(&graph[n].description));
    let seqs = graph.seqnums().flat_map(|s| tags_in_desc(&graph[s].description));
    nodes.chain(seqs).collect()
}

pub fn tags_of_node(graph: &Graph, n: NodeNum) -> BTreeSet<String> {
    tags_in_desc(&graph[n].description)
}

pub fn is_tagged_node(graph: &Graph, tag: &str, n: NodeNum) -> bool {
    tags_of_node(graph, n).contains(tag)
}

/// A sequence carries a tag itself, or inherits it when both of its ends do.
pub fn is_tagged_sequence(graph: &Graph, tag: &str, s: SeqNum) -> bool {
    if tags_in_desc(&graph[s].description).contains(tag) {
        return true;
    }
    match (graph.from(s), graph.to(s)) {
        (Ok(from), Ok(to)) => {
            is_tagged_node(graph, tag, from.node) && is_tagged_node(graph, tag, to.node)
        }
        _ => false,
    }
}

pub fn tagged_nodes<'a>(graph: &'a Graph, tag: &'a str) -> impl Iterator<Item = NodeNum> + 'a {
    graph.nodenums().filter(move |&n| is_tagged_node(graph, tag, n))
}

pub fn tagged_sequences<'a>(graph: &'a Graph, tag: &'a str) -> impl Iterator<Item = SeqNum> + 'a {
    graph.seqnums().filter(move |&s| is_tagged_sequence(graph, tag, s))
}

pub fn is_top_move(graph: &Graph, s: SeqNum) -> bool {
    properties_in_desc(&graph[s].description).contains("top")
}

pub fn is_bottom_move(graph: &Graph, s: SeqNum) -> bool {
    properties_in_desc(&graph[s].description).contains("bottom")
}

/// Tags that must be present (`true`) or absent (`false`).
pub type TagQuery = BTreeSet<(String, bool)>;

pub fn matches_query(graph: &Graph, query: &TagQuery, n: NodeNum) -> bool {
    let tags = tags_in_desc(&graph[n].description);
    query
        .iter()
        .all(|(tag, wanted)| tags.contains(tag) == *wanted)
}

pub fn matching_nodes<'a>(graph: &'a Graph, query: &'a TagQuery) -> impl Iterator<Item = NodeNum> + 'a {
    graph.nodenums().filter(move |&n| matches_query(graph, query, n))
}

/// A query singling out `n` as far as tags allow.
///
/// Starts from `n`'s own tags, then repeatedly excludes the tag most
/// common among the other matches, until nothing is left to exclude or
/// the query holds ten terms.
pub fn query_for(graph: &Graph, n: NodeNum) -> TagQuery {
    let mut query: TagQuery = tags_in_desc(&graph[n].description)
        .into_iter()
        .map(|t| (t, true))
        .collect();

    while query.len() < 10 {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for m in matching_nodes(graph, &query).filter(|&m| m != n) {
            for t in tags_in_desc(&graph[m].description) {
                if !query.contains(&(t.clone(), true)) && !query.contains(&(t.clone(), false)) {
                    *counts.entry(t).or_default() += 1;
                }
            }
        }

        // Ties go to the alphabetically first tag.
        let Some(best) = counts
            .into_iter()
            .fold(None::<(String, usize)>, |best, (t, c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((t, c)),
            })
        else {
            break;
        };
        query.insert((best.0, false));
    }

    query
}

/// Look a node up by name, or by a `p<number>` handle.
pub fn node_by_desc(graph: &Graph, desc: &str) -> Option<NodeNum> {
    if let Some(i) = desc.strip_prefix('p').and_then(|d| d.parse::<usize>().ok()) {
        return graph.nodenums().nth(i);
    }
    graph
        .nodenums()
        .find(|&n| name_of(&graph[n].description).as_deref() == Some(desc))
}

/// Look a sequence up by name, or by a `t<number>` handle, optionally
/// requiring it to leave `from` (backwards, if bidirectional).
pub fn step_by_desc(graph: &Graph, desc: &str, from: Option<NodeNum>) -> Option<Step> {
    let handle = desc.strip_prefix('t').and_then(|d| d.parse::<usize>().ok());

    graph
        .seqnums()
        .filter(|&s| {
            handle == Some(s.index()) || name_of(&graph[s].description).as_deref() == Some(desc)
        })
        .find_map(|s| {
            let Some(from) = from else {
                return Some(Step::forward(s));
            };
            let (start, end) = (graph.from(s).ok()?.node, graph.to(s).ok()?.node);
            if start == from {
                Some(Step::forward(s))
            } else if graph[s].bidirectional && end == from {
                Some(Step::backward(s))
            } else {
                None
            }
        })
}
