use super::Operation;

use strata_core::schema::db::{Function, Routine, StoredProcedure, View};
use strata_core::schema::ObjectName;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateView {
    pub name: ObjectName,

    /// `SELECT` body
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropView {
    pub name: ObjectName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateFunction {
    pub name: ObjectName,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropFunction {
    pub name: ObjectName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateStoredProcedure {
    pub name: ObjectName,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropStoredProcedure {
    pub name: ObjectName,
}

fn definition(routine: &impl Routine) -> String {
    routine.definition().unwrap_or_default().to_string()
}

impl Operation {
    pub fn create_view(view: &View) -> Self {
        CreateView {
            name: view.name.clone(),
            definition: definition(view),
        }
        .into()
    }

    pub fn drop_view(view: &View) -> Self {
        DropView {
            name: view.name.clone(),
        }
        .into()
    }

    pub fn create_function(function: &Function) -> Self {
        CreateFunction {
            name: function.name.clone(),
            definition: definition(function),
        }
        .into()
    }

    pub fn drop_function(function: &Function) -> Self {
        DropFunction {
            name: function.name.clone(),
        }
        .into()
    }

    pub fn create_stored_procedure(procedure: &StoredProcedure) -> Self {
        CreateStoredProcedure {
            name: procedure.name.clone(),
            definition: definition(procedure),
        }
        .into()
    }

    pub fn drop_stored_procedure(procedure: &StoredProcedure) -> Self {
        DropStoredProcedure {
            name: procedure.name.clone(),
        }
        .into()
    }
}

impl From<CreateView> for Operation {
    fn from(value: CreateView) -> Self {
        Self::CreateView(value)
    }
}

impl From<DropView> for Operation {
    fn from(value: DropView) -> Self {
        Self::DropView(value)
    }
}

impl From<CreateFunction> for Operation {
    fn from(value: CreateFunction) -> Self {
        Self::CreateFunction(value)
    }
}

impl From<DropFunction> for Operation {
    fn from(value: DropFunction) -> Self {
        Self::DropFunction(value)
    }
}

impl From<CreateStoredProcedure> for Operation {
    fn from(value: CreateStoredProcedure) -> Self {
        Self::CreateStoredProcedure(value)
    }
}

impl From<DropStoredProcedure> for Operation {
    fn from(value: DropStoredProcedure) -> Self {
        Self::DropStoredProcedure(value)
    }
}
