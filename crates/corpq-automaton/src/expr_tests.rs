use crate::expr::{Expr, ExprPool};

#[test]
fn structurally_equal_nodes_are_shared() {
    let mut pool = ExprPool::new();
    let (a, b) = (pool.sym(0), pool.sym(1));

    let x = pool.cat(a, b);
    let y = pool.cat(a, b);

    assert_eq!(x, y);
    assert_eq!(pool.len(), 3);
}

#[test]
fn alternation_is_flattened_sorted_and_deduplicated() {
    let mut pool = ExprPool::new();
    let (a, b, c) = (pool.sym(0), pool.sym(1), pool.sym(2));

    let ab = pool.alt(a, b);
    let left = pool.alt(ab, c);
    let cb = pool.alt(c, b);
    let right = pool.alt(cb, a);
    let dup = pool.alt(left, a);

    assert_eq!(left, right);
    assert_eq!(left, dup);
    assert_eq!(pool.get(left), &Expr::Alt(vec![a, b, c]));
}

#[test]
fn units_and_annihilators_fold() {
    let mut pool = ExprPool::new();
    let (zero, one, a) = (pool.zero(), pool.one(), pool.sym(0));

    assert_eq!(pool.cat(one, a), a);
    assert_eq!(pool.cat(a, one), a);
    assert_eq!(pool.cat(zero, a), zero);
    assert_eq!(pool.alt(zero, a), a);
    assert_eq!(pool.star(zero), one);

    let s = pool.star(a);
    assert_eq!(pool.star(s), s);
}

#[test]
fn concatenation_is_right_associated() {
    let mut pool = ExprPool::new();
    let (a, b, c) = (pool.sym(0), pool.sym(1), pool.sym(2));

    let ab = pool.cat(a, b);
    let left = pool.cat(ab, c);
    let bc = pool.cat(b, c);
    let right = pool.cat(a, bc);

    assert_eq!(left, right);
    assert_eq!(pool.render(left), "#0 #1 #2");
}

#[test]
fn nullability() {
    let mut pool = ExprPool::new();
    let a = pool.sym(0);
    let s = pool.star(a);
    let p = pool.plus(a);
    let o = pool.opt(a);

    assert!(!pool.nullable(a));
    assert!(pool.nullable(s));
    assert!(!pool.nullable(p));
    assert!(pool.nullable(o));
}

#[test]
fn derivatives() {
    let mut pool = ExprPool::new();
    let (a, b) = (pool.sym(0), pool.sym(1));
    let ab = pool.cat(a, b);
    let star = pool.star(ab);

    // d/d#0 (#0 #1)* = #1 (#0 #1)*
    let d = pool.derive(star, 0);
    assert_eq!(pool.render(d), "#1 (#0 #1)*");

    let dd = pool.derive(d, 1);
    assert_eq!(dd, star);

    let dead = pool.derive(star, 1);
    assert!(pool.is_zero(dead));
}

#[test]
fn symbols_in_order() {
    let mut pool = ExprPool::new();
    let (a, c) = (pool.sym(0), pool.sym(5));
    let alt = pool.alt(c, a);
    let e = pool.star(alt);

    assert_eq!(pool.symbols(e), vec![0, 5]);
}
