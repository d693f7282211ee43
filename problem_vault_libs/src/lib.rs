pub mod api;
pub mod client;
pub mod normalize;

pub use api::FieldList;
pub use problem_vault_derive::FieldList;

#[cfg(test)]
mod test {
    use crate::api::{FieldList, ProblemRecord};
    use problem_vault_derive::FieldList;

    #[allow(dead_code)]
    #[derive(FieldList)]
    struct ResponseDocument {
        id: i32,
        title: String,
        sentence: Vec<String>,
    }

    #[test]
    fn test_field_list() {
        assert_eq!(ResponseDocument::field_list(), "id,title,sentence");
    }

    #[test]
    fn problem_record_columns_follow_declaration_order() {
        assert_eq!(
            ProblemRecord::field_list(),
            "id,title,url,difficulty,description,solution,test_cases,tags,user_id,user_email,created_at,updated_at"
        );
    }
}
