use std::sync::Arc;

use corpq_core::{
    AlignmentAttribute, AttributeHandle, AttributeKind, Corpus, CorpusError, PositionalAttribute,
    StructuralAttribute,
};

use super::Environment;
use crate::engine::EvalError;
use crate::engine::test_utils::sample;

/// Corpus whose attribute lookups fail in the storage layer.
struct Unreadable;

impl Corpus for Unreadable {
    fn name(&self) -> &str {
        "BROKEN"
    }

    fn size(&self) -> usize {
        0
    }

    fn positional(&self, _name: &str) -> Option<Arc<dyn PositionalAttribute>> {
        None
    }

    fn structural(&self, _name: &str) -> Option<Arc<dyn StructuralAttribute>> {
        None
    }

    fn alignment(&self, _name: &str) -> Option<Arc<dyn AlignmentAttribute>> {
        None
    }

    fn lookup_attribute(
        &self,
        name: &str,
        _kind: AttributeKind,
    ) -> Result<AttributeHandle, CorpusError> {
        Err(CorpusError::Storage {
            attribute: name.to_owned(),
            message: "read failed".to_owned(),
        })
    }
}

#[test]
fn missing_attribute_is_a_query_error() {
    let env = Environment::new(sample());
    let err = env.positional("lemma").map(|_| ()).unwrap_err();

    assert_eq!(
        err,
        EvalError::UnknownAttribute {
            name: "lemma".to_owned(),
            kind: AttributeKind::Positional,
        }
    );
    assert!(err.is_user_error());
    assert!(env.structural("word").is_err());
}

#[test]
fn storage_failure_propagates() {
    let env = Environment::new(Arc::new(Unreadable));

    for err in [
        env.positional("word").map(|_| ()).unwrap_err(),
        env.structural("s").map(|_| ()).unwrap_err(),
        env.alignment("de").map(|_| ()).unwrap_err(),
    ] {
        assert!(matches!(err, EvalError::Corpus(CorpusError::Storage { .. })));
        assert!(!err.is_user_error());
    }
    insta::assert_snapshot!(
        env.positional("word").map(|_| ()).unwrap_err(),
        @"storage failure on attribute `word`: read failed"
    );
}
