//! Static table metadata
//!
//! Every entity exposes one `TableSchema`, built by `#[derive(Entity)]` as a
//! `static`. Relations point at their target schema through a function
//! pointer so that two entities can reference each other.

use crate::query_builder::expr::ExprNode;
use crate::query_builder::join::FetchJoin;
use crate::validation::quote_identifier;
use type_mapping::ValueType;

#[derive(Debug)]
pub struct ColumnSchema {
    pub name: &'static str,
    pub value_type: ValueType,
    pub nullable: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Owning side, stored as a foreign key column on this table
    ManyToOne { join_column: &'static str },
    /// Inverse side, resolved through the named relation on the target
    OneToMany { mapped_by: &'static str },
}

#[derive(Debug)]
pub struct RelationSchema {
    /// Field name of the association
    pub name: &'static str,
    pub kind: RelationKind,
    pub target: fn() -> &'static TableSchema,
}

impl RelationSchema {
    pub fn target_schema(&self) -> &'static TableSchema {
        (self.target)()
    }

    /// Foreign key column backing the association, on whichever table owns it
    pub fn foreign_key(&self) -> Option<&'static str> {
        match self.kind {
            RelationKind::ManyToOne { join_column } => Some(join_column),
            RelationKind::OneToMany { mapped_by } => {
                match self.target_schema().relation(mapped_by)?.kind {
                    RelationKind::ManyToOne { join_column } => Some(join_column),
                    RelationKind::OneToMany { .. } => None,
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    /// Rust type name, used in error messages
    pub entity: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [ColumnSchema],
    pub relations: &'static [RelationSchema],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&'static RelationSchema> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Column expressions selected when the entity is projected under
    /// `alias`, followed by the columns of every fetch-joined relation
    pub fn select_items(&'static self, alias: &str, fetches: &[FetchJoin]) -> Vec<ExprNode> {
        let mut items: Vec<ExprNode> = self
            .columns
            .iter()
            .map(|c| ExprNode::column(alias, c.name, c.value_type))
            .collect();

        for relation in self.relations {
            if let Some(target_alias) = FetchJoin::target_alias(fetches, alias, relation.name) {
                items.extend(relation.target_schema().select_items(target_alias, fetches));
            }
        }
        items
    }

    /// Number of row values produced by [`TableSchema::select_items`]
    pub fn projection_width(&'static self, alias: &str, fetches: &[FetchJoin]) -> usize {
        self.relations.iter().fold(self.columns.len(), |width, relation| {
            match FetchJoin::target_alias(fetches, alias, relation.name) {
                Some(target_alias) => {
                    width + relation.target_schema().projection_width(target_alias, fetches)
                }
                None => width,
            }
        })
    }

    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut definition = format!(
                    "{} {}",
                    quote_identifier(column.name),
                    column.value_type.pg_type()
                );
                if column.primary_key {
                    definition.push_str(" PRIMARY KEY");
                } else if !column.nullable {
                    definition.push_str(" NOT NULL");
                }
                if let Some(target) = self.referenced_table(column.name) {
                    definition.push_str(&format!(
                        " REFERENCES {} ({})",
                        quote_identifier(target.name),
                        quote_identifier(target.primary_key)
                    ));
                }
                definition
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(self.name),
            columns.join(", ")
        )
    }

    pub fn insert_sql(&self) -> String {
        let names: Vec<String> = self.columns.iter().map(|c| quote_identifier(c.name)).collect();
        let placeholders: Vec<String> = (1..=self.columns.len()).map(|i| format!("${}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(self.name),
            names.join(", "),
            placeholders.join(", ")
        )
    }

    /// Target table of a foreign key column, if the column is one
    pub fn referenced_table(&self, column: &str) -> Option<&'static TableSchema> {
        self.relations.iter().find_map(|relation| match relation.kind {
            RelationKind::ManyToOne { join_column } if join_column == column => {
                Some(relation.target_schema())
            }
            _ => None,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Hand-written schemas mirroring what the derive macro emits

    use super::*;

    pub static MEMBER: TableSchema = TableSchema {
        name: "member",
        entity: "Member",
        primary_key: "member_id",
        columns: &[
            ColumnSchema { name: "member_id", value_type: ValueType::Uuid, nullable: false, primary_key: true },
            ColumnSchema { name: "name", value_type: ValueType::Text, nullable: true, primary_key: false },
            ColumnSchema { name: "age", value_type: ValueType::Integer, nullable: false, primary_key: false },
            ColumnSchema { name: "team_id", value_type: ValueType::Uuid, nullable: true, primary_key: false },
        ],
        relations: &[RelationSchema {
            name: "team",
            kind: RelationKind::ManyToOne { join_column: "team_id" },
            target: team_schema,
        }],
    };

    pub static TEAM: TableSchema = TableSchema {
        name: "team",
        entity: "Team",
        primary_key: "team_id",
        columns: &[
            ColumnSchema { name: "team_id", value_type: ValueType::Uuid, nullable: false, primary_key: true },
            ColumnSchema { name: "name", value_type: ValueType::Text, nullable: false, primary_key: false },
        ],
        relations: &[RelationSchema {
            name: "members",
            kind: RelationKind::OneToMany { mapped_by: "team" },
            target: member_schema,
        }],
    };

    pub fn member_schema() -> &'static TableSchema {
        &MEMBER
    }

    pub fn team_schema() -> &'static TableSchema {
        &TEAM
    }
}
