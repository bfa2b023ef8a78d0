//! Hash-consed regular expression DAG.
//!
//! Every node is interned in an `IndexSet`, so structurally equal
//! subexpressions share one id and equality is an integer compare. The
//! smart constructors keep nodes in a normal form (alternatives flattened,
//! sorted and deduplicated; concatenation right-associated; units and
//! annihilators folded away). Derivatives of a normalised expression only
//! produce finitely many distinct nodes, which is what bounds the DFA.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexSet;

/// Input symbol: a pattern slot index.
pub type Symbol = u32;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Expr {
    /// Matches nothing.
    Zero,
    /// Matches the empty sequence.
    One,
    Sym(Symbol),
    /// Sorted, deduplicated, at least two operands, none of them `Alt` or `Zero`.
    Alt(Vec<ExprId>),
    /// Left operand is never a `Cat`.
    Cat(ExprId, ExprId),
    Star(ExprId),
}

/// Per-compilation interning pool.
#[derive(Debug, Default)]
pub struct ExprPool {
    nodes: IndexSet<Expr>,
    nullable: Vec<bool>,
    derivatives: HashMap<(ExprId, Symbol), ExprId>,
}

impl ExprPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, expr: Expr) -> ExprId {
        if let Some(i) = self.nodes.get_index_of(&expr) {
            return ExprId(i as u32);
        }
        let nullable = match &expr {
            Expr::Zero | Expr::Sym(_) => false,
            Expr::One | Expr::Star(_) => true,
            Expr::Alt(xs) => xs.iter().any(|x| self.nullable[x.index()]),
            Expr::Cat(a, b) => self.nullable[a.index()] && self.nullable[b.index()],
        };
        let (i, _) = self.nodes.insert_full(expr);
        self.nullable.push(nullable);
        ExprId(i as u32)
    }

    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the expression matches the empty sequence.
    #[inline]
    pub fn nullable(&self, id: ExprId) -> bool {
        self.nullable[id.index()]
    }

    pub fn zero(&mut self) -> ExprId {
        self.intern(Expr::Zero)
    }

    pub fn one(&mut self) -> ExprId {
        self.intern(Expr::One)
    }

    pub fn sym(&mut self, s: Symbol) -> ExprId {
        self.intern(Expr::Sym(s))
    }

    pub fn is_zero(&self, id: ExprId) -> bool {
        matches!(self.get(id), Expr::Zero)
    }

    pub fn alt(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.alt_all([a, b])
    }

    pub fn alt_all(&mut self, operands: impl IntoIterator<Item = ExprId>) -> ExprId {
        let mut flat = BTreeSet::new();
        for x in operands {
            match self.get(x) {
                Expr::Zero => {}
                Expr::Alt(xs) => flat.extend(xs.iter().copied()),
                _ => {
                    flat.insert(x);
                }
            }
        }
        match flat.len() {
            0 => self.zero(),
            1 => flat.into_iter().next().map_or_else(|| self.zero(), |x| x),
            _ => self.intern(Expr::Alt(flat.into_iter().collect())),
        }
    }

    pub fn cat(&mut self, a: ExprId, b: ExprId) -> ExprId {
        match (self.get(a), self.get(b)) {
            (Expr::Zero, _) | (_, Expr::Zero) => self.zero(),
            (Expr::One, _) => b,
            (_, Expr::One) => a,
            (Expr::Cat(x, y), _) => {
                let (x, y) = (*x, *y);
                let tail = self.cat(y, b);
                self.cat(x, tail)
            }
            _ => self.intern(Expr::Cat(a, b)),
        }
    }

    pub fn star(&mut self, a: ExprId) -> ExprId {
        match self.get(a) {
            Expr::Star(_) => a,
            Expr::Zero | Expr::One => self.one(),
            _ => self.intern(Expr::Star(a)),
        }
    }

    /// `e+ = e e*`
    pub fn plus(&mut self, a: ExprId) -> ExprId {
        let s = self.star(a);
        self.cat(a, s)
    }

    /// `[e] = 1 | e`
    pub fn opt(&mut self, a: ExprId) -> ExprId {
        let one = self.one();
        self.alt(one, a)
    }

    /// Brzozowski derivative with respect to `s`.
    pub fn derive(&mut self, e: ExprId, s: Symbol) -> ExprId {
        if let Some(&d) = self.derivatives.get(&(e, s)) {
            return d;
        }
        let d = match self.get(e).clone() {
            Expr::Zero | Expr::One => self.zero(),
            Expr::Sym(t) => {
                if t == s {
                    self.one()
                } else {
                    self.zero()
                }
            }
            Expr::Alt(xs) => {
                let ds: Vec<ExprId> = xs.into_iter().map(|x| self.derive(x, s)).collect();
                self.alt_all(ds)
            }
            Expr::Cat(a, b) => {
                let da = self.derive(a, s);
                let left = self.cat(da, b);
                if self.nullable(a) {
                    let db = self.derive(b, s);
                    self.alt(left, db)
                } else {
                    left
                }
            }
            Expr::Star(a) => {
                let da = self.derive(a, s);
                self.cat(da, e)
            }
        };
        self.derivatives.insert((e, s), d);
        d
    }

    /// Symbols occurring in `e`, ascending.
    pub fn symbols(&self, e: ExprId) -> Vec<Symbol> {
        let mut out = BTreeSet::new();
        let mut stack = vec![e];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            match self.get(id) {
                Expr::Zero | Expr::One => {}
                Expr::Sym(s) => {
                    out.insert(*s);
                }
                Expr::Alt(xs) => stack.extend(xs.iter().copied()),
                Expr::Cat(a, b) => stack.extend([*a, *b]),
                Expr::Star(a) => stack.push(*a),
            }
        }
        out.into_iter().collect()
    }

    /// Render in the pattern language with explicit `#n` slots.
    pub fn render(&self, e: ExprId) -> String {
        let mut out = String::new();
        self.render_into(e, &mut out);
        out
    }

    fn render_into(&self, e: ExprId, out: &mut String) {
        match self.get(e) {
            Expr::Zero => out.push('0'),
            Expr::One => out.push('1'),
            Expr::Sym(s) => {
                out.push('#');
                out.push_str(&s.to_string());
            }
            Expr::Alt(xs) => {
                out.push('(');
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    self.render_into(*x, out);
                }
                out.push(')');
            }
            Expr::Cat(a, b) => {
                self.render_into(*a, out);
                out.push(' ');
                self.render_into(*b, out);
            }
            Expr::Star(a) => {
                let grouped = matches!(self.get(*a), Expr::Cat(..));
                if grouped {
                    out.push('(');
                }
                self.render_into(*a, out);
                if grouped {
                    out.push(')');
                }
                out.push('*');
            }
        }
    }
}
