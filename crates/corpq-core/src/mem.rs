//! In-memory corpus.
//!
//! Good for tests and small tools: every attribute is held in plain
//! vectors, lexicons are insertion-ordered (`IndexSet`), and postings are
//! built once at construction.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::corpus::{
    AlignmentAttribute, Bead, Corpus, CorpusError, CorpusRegistry, PositionalAttribute, Region,
    StructuralAttribute,
};
use crate::{Cpos, LexId, Range};

/// Positional attribute backed by a token-id vector and posting lists.
#[derive(Debug)]
pub struct MemPositional {
    name: String,
    lexicon: IndexSet<String>,
    ids: Vec<LexId>,
    postings: Vec<Vec<Cpos>>,
}

impl MemPositional {
    fn new(name: &str, tokens: &[&str]) -> Self {
        let mut lexicon = IndexSet::new();
        let mut ids = Vec::with_capacity(tokens.len());
        for tok in tokens {
            let (id, _) = lexicon.insert_full((*tok).to_owned());
            ids.push(id as LexId);
        }
        let mut postings = vec![Vec::new(); lexicon.len()];
        for (cpos, &id) in ids.iter().enumerate() {
            postings[id as usize].push(cpos as Cpos);
        }
        Self {
            name: name.to_owned(),
            lexicon,
            ids,
            postings,
        }
    }
}

impl PositionalAttribute for MemPositional {
    fn name(&self) -> &str {
        &self.name
    }

    fn lexicon_size(&self) -> usize {
        self.lexicon.len()
    }

    fn str_to_id(&self, value: &str) -> Option<LexId> {
        self.lexicon.get_index_of(value).map(|i| i as LexId)
    }

    fn id_to_str(&self, id: LexId) -> Option<&str> {
        self.lexicon.get_index(id as usize).map(String::as_str)
    }

    fn id_to_freq(&self, id: LexId) -> usize {
        self.postings.get(id as usize).map_or(0, Vec::len)
    }

    fn cpos_to_id(&self, cpos: Cpos) -> Option<LexId> {
        usize::try_from(cpos).ok().and_then(|i| self.ids.get(i).copied())
    }

    fn id_to_positions(&self, id: LexId) -> Result<Vec<Cpos>, CorpusError> {
        Ok(self.postings.get(id as usize).cloned().unwrap_or_default())
    }
}

/// Structural attribute: sorted, non-overlapping regions.
#[derive(Debug)]
pub struct MemStructural {
    name: String,
    regions: Vec<Range>,
    values: Option<Vec<String>>,
}

impl StructuralAttribute for MemStructural {
    fn name(&self) -> &str {
        &self.name
    }

    fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn region(&self, index: usize) -> Option<Region> {
        self.regions.get(index).map(|r| Region {
            index,
            start: r.start,
            end: r.end,
        })
    }

    fn region_at(&self, cpos: Cpos) -> Option<Region> {
        let idx = self.regions.partition_point(|r| r.start <= cpos).checked_sub(1)?;
        let r = self.regions[idx];
        r.contains(cpos).then_some(Region {
            index: idx,
            start: r.start,
            end: r.end,
        })
    }

    fn region_value(&self, index: usize) -> Option<&str> {
        self.values.as_ref()?.get(index).map(String::as_str)
    }

    fn has_values(&self) -> bool {
        self.values.is_some()
    }
}

/// Alignment attribute: beads sorted by source start.
#[derive(Debug)]
pub struct MemAlignment {
    name: String,
    target: String,
    beads: Vec<Bead>,
}

impl AlignmentAttribute for MemAlignment {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_corpus(&self) -> &str {
        &self.target
    }

    fn bead_at(&self, cpos: Cpos) -> Option<Bead> {
        let idx = self
            .beads
            .partition_point(|b| b.source.start <= cpos)
            .checked_sub(1)?;
        let bead = self.beads[idx];
        bead.source.contains(cpos).then_some(bead)
    }
}

/// In-memory corpus. Build with [`MemCorpus::builder`].
#[derive(Debug)]
pub struct MemCorpus {
    name: String,
    size: usize,
    positional: HashMap<String, Arc<MemPositional>>,
    structural: HashMap<String, Arc<MemStructural>>,
    alignment: HashMap<String, Arc<MemAlignment>>,
}

impl MemCorpus {
    pub fn builder(name: impl Into<String>) -> MemCorpusBuilder {
        MemCorpusBuilder {
            name: name.into(),
            positional: Vec::new(),
            structural: Vec::new(),
            alignment: Vec::new(),
        }
    }
}

impl Corpus for MemCorpus {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.size
    }

    fn positional(&self, name: &str) -> Option<Arc<dyn PositionalAttribute>> {
        self.positional
            .get(name)
            .map(|a| Arc::clone(a) as Arc<dyn PositionalAttribute>)
    }

    fn structural(&self, name: &str) -> Option<Arc<dyn StructuralAttribute>> {
        self.structural
            .get(name)
            .map(|a| Arc::clone(a) as Arc<dyn StructuralAttribute>)
    }

    fn alignment(&self, name: &str) -> Option<Arc<dyn AlignmentAttribute>> {
        self.alignment
            .get(name)
            .map(|a| Arc::clone(a) as Arc<dyn AlignmentAttribute>)
    }
}

/// Builder for [`MemCorpus`].
///
/// The first positional attribute fixes the corpus size; every later one
/// must have the same number of tokens.
#[derive(Debug)]
pub struct MemCorpusBuilder {
    name: String,
    positional: Vec<(String, Vec<String>)>,
    structural: Vec<(String, Vec<Range>, Option<Vec<String>>)>,
    alignment: Vec<(String, String, Vec<Bead>)>,
}

impl MemCorpusBuilder {
    pub fn positional(mut self, name: &str, tokens: &[&str]) -> Self {
        self.positional.push((
            name.to_owned(),
            tokens.iter().map(|t| (*t).to_owned()).collect(),
        ));
        self
    }

    /// Positional attribute from whitespace-separated text.
    pub fn positional_text(self, name: &str, text: &str) -> Self {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        self.positional(name, &tokens)
    }

    pub fn structural(mut self, name: &str, regions: &[(Cpos, Cpos)]) -> Self {
        self.structural.push((
            name.to_owned(),
            regions.iter().map(|&(s, e)| Range::new(s, e)).collect(),
            None,
        ));
        self
    }

    pub fn structural_with_values(mut self, name: &str, regions: &[(Cpos, Cpos, &str)]) -> Self {
        self.structural.push((
            name.to_owned(),
            regions.iter().map(|&(s, e, _)| Range::new(s, e)).collect(),
            Some(regions.iter().map(|&(_, _, v)| v.to_owned()).collect()),
        ));
        self
    }

    pub fn alignment(mut self, name: &str, target: &str, beads: &[(Range, Range)]) -> Self {
        self.alignment.push((
            name.to_owned(),
            target.to_owned(),
            beads
                .iter()
                .map(|&(source, target)| Bead { source, target })
                .collect(),
        ));
        self
    }

    pub fn build(self) -> Result<MemCorpus, CorpusError> {
        let size = self.positional.first().map_or(0, |(_, t)| t.len());
        let mut corpus = MemCorpus {
            name: self.name,
            size,
            positional: HashMap::new(),
            structural: HashMap::new(),
            alignment: HashMap::new(),
        };

        for (name, tokens) in &self.positional {
            if tokens.len() != size {
                return Err(CorpusError::Inconsistent(format!(
                    "attribute `{name}` has {} tokens, expected {size}",
                    tokens.len()
                )));
            }
            let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
            corpus
                .positional
                .insert(name.clone(), Arc::new(MemPositional::new(name, &refs)));
        }

        for (name, regions, values) in self.structural {
            check_regions(&name, &regions, size)?;
            corpus.structural.insert(
                name.clone(),
                Arc::new(MemStructural {
                    name,
                    regions,
                    values,
                }),
            );
        }

        for (name, target, mut beads) in self.alignment {
            beads.sort_by_key(|b| b.source.start);
            let sources: Vec<Range> = beads.iter().map(|b| b.source).collect();
            check_regions(&name, &sources, size)?;
            corpus.alignment.insert(
                name.clone(),
                Arc::new(MemAlignment {
                    name,
                    target,
                    beads,
                }),
            );
        }

        Ok(corpus)
    }
}

fn check_regions(name: &str, regions: &[Range], size: usize) -> Result<(), CorpusError> {
    for r in regions {
        if r.start < 0 || r.end < r.start || r.end as usize >= size {
            return Err(CorpusError::Inconsistent(format!(
                "region [{}, {}] of `{name}` is outside the corpus",
                r.start, r.end
            )));
        }
    }
    if regions.windows(2).any(|w| w[0].end >= w[1].start) {
        return Err(CorpusError::Inconsistent(format!(
            "regions of `{name}` overlap or are unsorted"
        )));
    }
    Ok(())
}

/// Name-indexed collection of corpora.
#[derive(Debug, Default)]
pub struct MemRegistry {
    corpora: HashMap<String, Arc<dyn Corpus>>,
}

impl MemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, corpus: Arc<dyn Corpus>) {
        self.corpora.insert(corpus.name().to_owned(), corpus);
    }
}

impl CorpusRegistry for MemRegistry {
    fn corpus(&self, name: &str) -> Option<Arc<dyn Corpus>> {
        self.corpora.get(name).cloned()
    }
}
