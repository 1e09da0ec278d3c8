//! Parameter and join alias generation.

/// Generates names that are unique within one query-building session.
pub trait QueryNameGenerator {
    /// A fresh parameter name derived from `hint` (usually the field name).
    fn generate_parameter_name(&mut self, hint: &str) -> String;

    /// A fresh alias for joining `association`.
    fn generate_join_alias(&mut self, association: &str) -> String;
}

/// Counter-based generator: `createdAt_p1`, `relatedDummy_a1`, ...
///
/// Use one generator per query; names are only unique per instance.
#[derive(Debug, Default, Clone)]
pub struct DefaultQueryNameGenerator {
    parameters: u32,
    joins: u32,
}

impl DefaultQueryNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueryNameGenerator for DefaultQueryNameGenerator {
    fn generate_parameter_name(&mut self, hint: &str) -> String {
        self.parameters += 1;
        format!("{}_p{}", hint.replace('.', "_"), self.parameters)
    }

    fn generate_join_alias(&mut self, association: &str) -> String {
        self.joins += 1;
        format!("{}_a{}", association.replace('.', "_"), self.joins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_names_are_unique_and_sanitized() {
        let mut names = DefaultQueryNameGenerator::new();
        assert_eq!(names.generate_parameter_name("age"), "age_p1");
        assert_eq!(names.generate_parameter_name("age"), "age_p2");
        assert_eq!(names.generate_parameter_name("owner.age"), "owner_age_p3");
    }

    #[test]
    fn join_counter_is_separate_from_parameter_counter() {
        let mut names = DefaultQueryNameGenerator::new();
        names.generate_parameter_name("age");
        assert_eq!(names.generate_join_alias("relatedDummy"), "relatedDummy_a1");
        assert_eq!(names.generate_join_alias("owner"), "owner_a2");
    }
}
