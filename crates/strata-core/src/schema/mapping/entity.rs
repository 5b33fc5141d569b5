use super::Fragment;
use crate::schema::app::{EntityTypeId, PropertyId};
use crate::schema::db::{ColumnId, StoreObjectId, TableId};

/// Where one entity type's data lives.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMapping {
    pub id: EntityTypeId,

    /// Store objects holding the type's properties. The main table comes
    /// first, followed by split fragments, then views, functions and stored
    /// procedures.
    pub fragments: Vec<Fragment>,
}

impl EntityMapping {
    pub(crate) fn new(id: EntityTypeId) -> Self {
        Self {
            id,
            fragments: vec![],
        }
    }

    /// The table rows of this type are inserted into, if any.
    pub fn table(&self) -> Option<TableId> {
        self.fragments.iter().find_map(|f| f.store.as_table())
    }

    /// Tables holding the type's data, main table first.
    pub fn tables(&self) -> impl Iterator<Item = TableId> + '_ {
        self.fragments.iter().filter_map(|f| f.store.as_table())
    }

    pub fn fragment(&self, store: StoreObjectId) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.store == store)
    }

    /// Column `property` is stored in within `store`.
    pub fn column(&self, store: StoreObjectId, property: PropertyId) -> Option<ColumnId> {
        self.fragment(store)?.column(property)
    }

    pub(crate) fn fragment_mut(&mut self, store: StoreObjectId) -> &mut Fragment {
        match self.fragments.iter().position(|f| f.store == store) {
            Some(index) => &mut self.fragments[index],
            None => {
                self.fragments.push(Fragment::new(store));
                self.fragments.last_mut().expect("fragment was just pushed")
            }
        }
    }
}
