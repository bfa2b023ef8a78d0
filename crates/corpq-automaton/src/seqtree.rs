//! Sequence evaluation trees and their rendering into the pattern language.
//!
//! The query front end describes how pattern slots combine as a tree; the
//! tree is rendered to a pattern string with `#n` slot references and then
//! compiled like any other pattern. Bounded repetition and
//! order-independent groups have no direct syntax and are expanded here.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeqTree {
    /// One pattern slot.
    Leaf(usize),
    /// Ordered concatenation.
    Concat(Vec<SeqTree>),
    /// Concatenation in any order.
    AnyOrder(Vec<SeqTree>),
    /// Disjunction.
    Or(Vec<SeqTree>),
    /// `{min,max}`; `max: None` is unbounded.
    Repeat {
        inner: Box<SeqTree>,
        min: u32,
        max: Option<u32>,
    },
}

impl SeqTree {
    pub fn repeat(inner: SeqTree, min: u32, max: Option<u32>) -> Self {
        SeqTree::Repeat {
            inner: Box::new(inner),
            min,
            max,
        }
    }

    /// Render as a pattern string.
    ///
    /// `max_permutation` bounds the size of `AnyOrder` groups, whose
    /// expansion is factorial.
    pub fn to_pattern(&self, max_permutation: usize) -> Result<String> {
        let mut out = String::new();
        self.render(&mut out, max_permutation)?;
        Ok(out)
    }

    /// Highest slot referenced, if any.
    pub fn max_slot(&self) -> Option<usize> {
        match self {
            SeqTree::Leaf(n) => Some(*n),
            SeqTree::Concat(xs) | SeqTree::AnyOrder(xs) | SeqTree::Or(xs) => {
                xs.iter().filter_map(SeqTree::max_slot).max()
            }
            SeqTree::Repeat { inner, .. } => inner.max_slot(),
        }
    }

    fn render(&self, out: &mut String, max_permutation: usize) -> Result<()> {
        match self {
            SeqTree::Leaf(n) => {
                let _ = write!(out, "#{n}");
            }
            SeqTree::Concat(xs) => render_seq(xs.iter(), out, max_permutation)?,
            SeqTree::Or(xs) => {
                if xs.is_empty() {
                    out.push('0');
                    return Ok(());
                }
                out.push('(');
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    x.render(out, max_permutation)?;
                }
                out.push(')');
            }
            SeqTree::AnyOrder(xs) => {
                if xs.len() > max_permutation {
                    return Err(Error::TooManyPermutations {
                        count: xs.len(),
                        limit: max_permutation,
                    });
                }
                if xs.is_empty() {
                    out.push('1');
                    return Ok(());
                }
                out.push('(');
                for (i, perm) in permutations(xs.len()).into_iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    render_seq(perm.iter().map(|&k| &xs[k]), out, max_permutation)?;
                }
                out.push(')');
            }
            SeqTree::Repeat { inner, min, max } => {
                if let Some(max) = max
                    && max < min
                {
                    return Err(Error::InvalidRepeat {
                        min: *min,
                        max: *max,
                    });
                }
                let mut body = String::new();
                inner.render(&mut body, max_permutation)?;

                let mut parts: Vec<String> = (0..*min).map(|_| body.clone()).collect();
                match max {
                    None => parts.push(format!("{body}*")),
                    Some(max) => {
                        let optional = max - min;
                        if optional > 0 {
                            let mut nested = String::new();
                            for k in 0..optional {
                                if k > 0 {
                                    nested.push(' ');
                                }
                                nested.push('[');
                                nested.push_str(&body);
                            }
                            nested.push_str(&"]".repeat(optional as usize));
                            parts.push(nested);
                        }
                    }
                }
                if parts.is_empty() {
                    out.push('1');
                } else {
                    let _ = write!(out, "({})", parts.join(" "));
                }
            }
        }
        Ok(())
    }
}

fn render_seq<'a>(
    items: impl ExactSizeIterator<Item = &'a SeqTree>,
    out: &mut String,
    max_permutation: usize,
) -> Result<()> {
    if items.len() == 0 {
        out.push('1');
        return Ok(());
    }
    out.push('(');
    for (i, x) in items.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        x.render(out, max_permutation)?;
    }
    out.push(')');
    Ok(())
}

/// All permutations of `0..n` in lexicographic order.
fn permutations(n: usize) -> Vec<Vec<usize>> {
    let mut current: Vec<usize> = (0..n).collect();
    let mut out = vec![current.clone()];
    loop {
        let Some(i) = (1..n).rev().find(|&i| current[i - 1] < current[i]) else {
            return out;
        };
        let pivot = i - 1;
        let Some(j) = (i..n).rev().find(|&j| current[j] > current[pivot]) else {
            return out;
        };
        current.swap(pivot, j);
        current[i..].reverse();
        out.push(current.clone());
    }
}
