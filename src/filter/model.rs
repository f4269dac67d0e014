//! In-memory filter model: an ordered, never-empty list of condition groups.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Between,
    Contains,
    IsEmpty,
    IsNotEmpty,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Ge,
        Operator::Le,
        Operator::Between,
        Operator::Contains,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
    ];

    /// Token used in saved documents, and the SQL symbol for comparisons.
    pub fn token(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Between => "zwischen",
            Operator::Contains => "enthält",
            Operator::IsEmpty => "ist leer",
            Operator::IsNotEmpty => "ist nicht leer",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operator::ALL
            .into_iter()
            .find(|op| op.token() == s)
            .ok_or_else(|| Error::Format(format!("Unknown operator '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOp {
    And,
    Or,
}

impl JoinOp {
    pub fn token(self) -> &'static str {
        match self {
            JoinOp::And => "UND",
            JoinOp::Or => "ODER",
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            JoinOp::And => "AND",
            JoinOp::Or => "OR",
        }
    }
}

impl fmt::Display for JoinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for JoinOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "UND" => Ok(JoinOp::And),
            "ODER" => Ok(JoinOp::Or),
            _ => Err(Error::Format(format!("Unknown group operator '{}'", s))),
        }
    }
}

/// A single `field operator value` predicate.
///
/// `value2` only takes part in rendering for [`Operator::Between`], but it is
/// kept for every operator so switching back and forth loses nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value1: String,
    pub value2: String,
    /// Set from the field catalog; date values are `YYYY-MM-DD`.
    pub is_date: bool,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: Operator,
        value1: impl Into<String>,
        value2: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value1: value1.into(),
            value2: value2.into(),
            is_date: false,
        }
    }

    pub fn empty(field: impl Into<String>) -> Self {
        Self::new(field, Operator::Eq, "", "")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    join: JoinOp,
    conditions: Vec<Condition>,
}

impl Group {
    pub fn new(join: JoinOp) -> Self {
        Self {
            join,
            conditions: Vec::new(),
        }
    }

    pub fn with_conditions(join: JoinOp, conditions: Vec<Condition>) -> Self {
        Self { join, conditions }
    }

    pub fn join(&self) -> JoinOp {
        self.join
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterModel {
    groups: Vec<Group>,
    default_field: String,
}

impl FilterModel {
    /// One group holding one empty condition on `default_field`, which is
    /// also the field given to every condition added later.
    pub fn new(default_field: impl Into<String>) -> Self {
        let mut model = Self {
            groups: Vec::new(),
            default_field: default_field.into(),
        };
        model.add_group();
        model
    }

    /// Builds a model from loaded groups. An empty list falls back to a
    /// single group without conditions, and the first group is always `And`.
    pub fn from_groups(groups: Vec<Group>, default_field: impl Into<String>) -> Self {
        let mut groups = groups;
        if groups.is_empty() {
            groups.push(Group::new(JoinOp::And));
        }
        groups[0].join = JoinOp::And;
        Self {
            groups,
            default_field: default_field.into(),
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    pub fn set_default_field(&mut self, field: impl Into<String>) {
        self.default_field = field.into();
    }

    fn next_join(&self) -> JoinOp {
        if self.groups.is_empty() {
            JoinOp::And
        } else {
            JoinOp::Or
        }
    }

    pub fn add_group(&mut self) -> usize {
        let mut group = Group::new(self.next_join());
        group
            .conditions
            .push(Condition::empty(self.default_field.clone()));
        self.groups.push(group);
        self.groups.len() - 1
    }

    pub fn remove_group(&mut self, group: usize) -> Result<Group> {
        self.check_group(group)?;
        if self.groups.len() <= 1 {
            return Err(Error::InvariantViolation(
                "a filter needs at least one group".to_string(),
            ));
        }
        let removed = self.groups.remove(group);
        self.groups[0].join = JoinOp::And;
        Ok(removed)
    }

    /// Appends a copy of `group`'s conditions as a new group.
    pub fn duplicate_group(&mut self, group: usize) -> Result<usize> {
        self.check_group(group)?;
        let conditions = self.groups[group].conditions.clone();
        let copy = Group::with_conditions(self.next_join(), conditions);
        self.groups.push(copy);
        Ok(self.groups.len() - 1)
    }

    /// The first group has nothing to join to, so its operator is fixed.
    pub fn set_join(&mut self, group: usize, join: JoinOp) -> Result<()> {
        self.check_group(group)?;
        if group == 0 {
            return Err(Error::InvariantViolation(
                "the first group's operator is fixed to AND".to_string(),
            ));
        }
        self.groups[group].join = join;
        Ok(())
    }

    pub fn add_condition(&mut self, group: usize) -> Result<usize> {
        self.check_group(group)?;
        let field = self.default_field.clone();
        let conditions = &mut self.groups[group].conditions;
        conditions.push(Condition::empty(field));
        Ok(conditions.len() - 1)
    }

    pub fn remove_condition(&mut self, group: usize, condition: usize) -> Result<Condition> {
        self.check_condition(group, condition)?;
        Ok(self.groups[group].conditions.remove(condition))
    }

    pub fn condition_mut(&mut self, group: usize, condition: usize) -> Result<&mut Condition> {
        self.check_condition(group, condition)?;
        Ok(&mut self.groups[group].conditions[condition])
    }

    pub(crate) fn conditions_mut(&mut self) -> impl Iterator<Item = &mut Condition> {
        self.groups
            .iter_mut()
            .flat_map(|group| group.conditions.iter_mut())
    }

    /// True when two or more groups exist and every group after the first
    /// is joined with `AND`, which narrows the result to records matching
    /// all groups at once.
    pub fn all_groups_anded(&self) -> bool {
        self.groups.len() > 1 && self.groups[1..].iter().all(|g| g.join == JoinOp::And)
    }

    fn check_group(&self, group: usize) -> Result<()> {
        if group < self.groups.len() {
            Ok(())
        } else {
            Err(Error::GroupOutOfRange(group))
        }
    }

    fn check_condition(&self, group: usize, condition: usize) -> Result<()> {
        self.check_group(group)?;
        if condition < self.groups[group].conditions.len() {
            Ok(())
        } else {
            Err(Error::ConditionOutOfRange { group, condition })
        }
    }
}

impl Default for FilterModel {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_model_has_one_and_group() {
        let model = FilterModel::new("name");
        assert_eq!(model.groups().len(), 1);
        assert_eq!(model.groups()[0].join(), JoinOp::And);
        assert_eq!(model.groups()[0].conditions(), &[Condition::empty("name")]);
    }

    #[test]
    fn test_added_groups_default_to_or() {
        let mut model = FilterModel::new("name");
        let idx = model.add_group();
        assert_eq!(idx, 1);
        assert_eq!(model.groups()[1].join(), JoinOp::Or);
        assert_eq!(model.groups()[1].conditions().len(), 1);
    }

    #[test]
    fn test_remove_last_group_fails() {
        let mut model = FilterModel::new("name");
        let before = model.clone();
        let err = model.remove_group(0).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
        assert_eq!(model, before);
    }

    #[test]
    fn test_remove_first_group_promotes_next_to_and() {
        let mut model = FilterModel::new("name");
        model.add_group();
        model.remove_group(0).unwrap();
        assert_eq!(model.groups().len(), 1);
        assert_eq!(model.groups()[0].join(), JoinOp::And);
        assert!(model.set_join(0, JoinOp::Or).is_err());
    }

    #[test]
    fn test_duplicate_group_copies_conditions() {
        let mut model = FilterModel::new("name");
        *model.condition_mut(0, 0).unwrap() =
            Condition::new("status", Operator::Eq, "Approved (A)", "");
        model.add_condition(0).unwrap();
        model.condition_mut(0, 1).unwrap().operator = Operator::IsEmpty;

        let idx = model.duplicate_group(0).unwrap();
        assert_eq!(model.groups()[idx].join(), JoinOp::Or);
        assert_eq!(model.groups()[idx].conditions(), model.groups()[0].conditions());
    }

    #[test]
    fn test_conditions_can_reach_zero() {
        let mut model = FilterModel::new("name");
        model.remove_condition(0, 0).unwrap();
        assert!(model.groups()[0].conditions().is_empty());
        assert!(matches!(
            model.remove_condition(0, 0),
            Err(Error::ConditionOutOfRange { group: 0, condition: 0 })
        ));
    }

    #[test]
    fn test_all_groups_anded() {
        let mut model = FilterModel::new("name");
        assert!(!model.all_groups_anded());

        model.add_group();
        model.add_group();
        assert!(!model.all_groups_anded());

        model.set_join(1, JoinOp::And).unwrap();
        model.set_join(2, JoinOp::And).unwrap();
        assert!(model.all_groups_anded());
    }

    #[test]
    fn test_operator_tokens() {
        for op in Operator::ALL {
            assert_eq!(op.token().parse::<Operator>().unwrap(), op);
        }
        assert!("like".parse::<Operator>().is_err());
        assert_eq!("ODER".parse::<JoinOp>().unwrap(), JoinOp::Or);
    }

    #[test]
    fn test_from_groups_enforces_first_and() {
        let model = FilterModel::from_groups(vec![Group::new(JoinOp::Or)], "x");
        assert_eq!(model.groups()[0].join(), JoinOp::And);

        let model = FilterModel::from_groups(Vec::new(), "x");
        assert_eq!(model.groups().len(), 1);
        assert!(model.groups()[0].conditions().is_empty());
    }
}
