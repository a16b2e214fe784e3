use entity_derive::model;
use query_core::Lazy;
use uuid::Uuid;

use crate::model::team::Team;

#[model]
#[table(name = "member")]
pub struct Member {
    #[primary_key]
    #[column(name = "member_id")]
    pub id: Uuid,

    pub name: Option<String>,

    pub age: i32,

    #[many_to_one(join_column = "team_id")]
    pub team: Option<Lazy<Team>>,
}

impl Member {
    /// A member of `team`; the team's member list is updated as well.
    ///
    /// The member keeps a loaded copy of `team` as it was at this call.
    /// Members added to `team` afterwards do not appear in that copy, so
    /// read the member list from the team itself.
    pub fn new(name: Option<&str>, age: i32, team: &mut Team) -> Self {
        let mut member = Self::without_team(name, age);
        member.change_team(team);
        member
    }

    pub fn without_team(name: Option<&str>, age: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.map(str::to_string),
            age,
            team: None,
        }
    }

    /// A member aged 0 with no team
    pub fn named(name: Option<&str>) -> Self {
        Self::without_team(name, 0)
    }

    fn change_team(&mut self, team: &mut Team) {
        team.members.push(self.id);
        self.team = Some(Lazy::loaded(team.clone()));
    }

    /// Id of the member's team, loaded or not
    pub fn team_id(&self) -> Option<Uuid> {
        self.team.as_ref().map(Lazy::id)
    }
}
