use crate::schema::app::{Sequence, SequenceCache, Type};
use crate::schema::Value;

pub struct SequenceBuilder<'a> {
    sequence: &'a mut Sequence,
}

impl<'a> SequenceBuilder<'a> {
    pub(super) fn new(sequence: &'a mut Sequence) -> Self {
        Self { sequence }
    }

    /// Value type; must be an integer type.
    pub fn has_type(&mut self, ty: Type) -> &mut Self {
        self.sequence.ty = ty;
        self
    }

    pub fn starts_at(&mut self, start: i64) -> &mut Self {
        self.sequence.start = start;
        self
    }

    pub fn increments_by(&mut self, increment: i64) -> &mut Self {
        self.sequence.increment = increment;
        self
    }

    pub fn has_min(&mut self, min: i64) -> &mut Self {
        self.sequence.min = Some(min);
        self
    }

    pub fn has_max(&mut self, max: i64) -> &mut Self {
        self.sequence.max = Some(max);
        self
    }

    pub fn is_cyclic(&mut self) -> &mut Self {
        self.sequence.cyclic = true;
        self
    }

    pub fn use_cache(&mut self, size: u32) -> &mut Self {
        self.sequence.cache = SequenceCache::Size(size);
        self
    }

    pub fn use_no_cache(&mut self) -> &mut Self {
        self.sequence.cache = SequenceCache::NoCache;
        self
    }

    pub fn has_annotation(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.sequence.annotations.set(key, value);
        self
    }
}
