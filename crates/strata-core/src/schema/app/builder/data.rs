use crate::schema::Value;

/// Sets the values of one seed row.
pub struct DataBuilder<'a> {
    row: &'a mut Vec<(String, Value)>,
}

impl<'a> DataBuilder<'a> {
    pub(super) fn new(row: &'a mut Vec<(String, Value)>) -> Self {
        Self { row }
    }

    pub fn value(&mut self, property: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        match self.row.iter_mut().find(|(p, _)| p == property) {
            Some((_, existing)) => *existing = value,
            None => self.row.push((property.to_string(), value)),
        }
        self
    }
}
