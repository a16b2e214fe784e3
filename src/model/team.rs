use entity_derive::model;
use uuid::Uuid;

use crate::model::member::Member;

#[model]
#[table(name = "team")]
pub struct Team {
    #[primary_key]
    #[column(name = "team_id")]
    pub id: Uuid,

    pub name: String,

    /// Ids of the members that joined through [`Member::new`]; not stored
    #[one_to_many(target = Member, mapped_by = "team")]
    pub members: Vec<Uuid>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn has_member(&self, member: &Member) -> bool {
        self.members.contains(&member.id)
    }
}
