//! Search query assembly for the two supported axes
//!
//! A search runs against one of two secondary indexes: by patient (index 1,
//! keyed on `P#<nhs_number>`) or by custodian (index 2, keyed on
//! `O#<custodian>[#<suffix>]`). Either axis can additionally filter on
//! document type (an OR of equalities) and on the other axis's identifier.
//! Filters are evaluated by the store after paging, so selectivity says
//! nothing about page count.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use signpost_models::{organisation_key, patient_key, DocumentPointer};

/// Items returned per search page, and the per-request page limit handed to
/// the store. More results require re-invocation with the prior token.
pub const PAGE_ITEM_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Patient,
    Custodian,
}

/// A search over one of the two secondary indexes.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    axis: Axis,
    partition_key: String,
    pointer_types: Vec<String>,
    custodian: Option<String>,
    nhs_number: Option<String>,
}

impl SearchQuery {
    /// Search a patient's pointers (index 1).
    pub fn for_patient(nhs_number: &str) -> Self {
        Self {
            axis: Axis::Patient,
            partition_key: patient_key(nhs_number),
            pointer_types: Vec::new(),
            custodian: None,
            nhs_number: None,
        }
    }

    /// Search a custodian's pointers (index 2).
    pub fn for_custodian(custodian: &str, custodian_suffix: Option<&str>) -> Self {
        Self {
            axis: Axis::Custodian,
            partition_key: organisation_key(custodian, custodian_suffix),
            pointer_types: Vec::new(),
            custodian: None,
            nhs_number: None,
        }
    }

    /// Restrict to pointers of any of the given types (OR of equality).
    pub fn with_pointer_types<I, T>(mut self, pointer_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.pointer_types = pointer_types.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict a patient search to a single custodian.
    pub fn with_custodian(mut self, custodian: &str) -> Self {
        self.custodian = Some(custodian.to_string());
        self
    }

    /// Restrict a custodian search to a single patient.
    pub fn with_nhs_number(mut self, nhs_number: &str) -> Self {
        self.nhs_number = Some(nhs_number.to_string());
        self
    }

    /// The partition key value the key condition matches on.
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn pointer_types(&self) -> &[String] {
        &self.pointer_types
    }

    pub fn custodian(&self) -> Option<&str> {
        self.custodian.as_deref()
    }

    pub fn nhs_number(&self) -> Option<&str> {
        self.nhs_number.as_deref()
    }

    /// Name of the secondary index this query runs against.
    pub fn index_name(&self) -> &'static str {
        match self.axis {
            Axis::Patient => "idx_gsi_1",
            Axis::Custodian => "idx_gsi_2",
        }
    }

    /// Partition key attribute of that index.
    pub fn key_attribute(&self) -> &'static str {
        match self.axis {
            Axis::Patient => "pk_1",
            Axis::Custodian => "pk_2",
        }
    }

    /// Sort key attribute of that index.
    pub fn sort_attribute(&self) -> &'static str {
        match self.axis {
            Axis::Patient => "sk_1",
            Axis::Custodian => "sk_2",
        }
    }

    /// The value `pointer` carries in this query's index partition key.
    pub(crate) fn index_partition_value(&self, pointer: &DocumentPointer) -> String {
        match self.axis {
            Axis::Patient => pointer.patient_key(),
            Axis::Custodian => pointer.organisation_key(),
        }
    }

    /// `KeyConditionExpression` for the store.
    pub fn key_condition_expression(&self) -> String {
        format!("{} = :pk", self.key_attribute())
    }

    /// `FilterExpression`, when any filters apply.
    pub fn filter_expression(&self) -> Option<String> {
        let mut clauses = Vec::new();

        if !self.pointer_types.is_empty() {
            let alternatives: Vec<String> = (0..self.pointer_types.len())
                .map(|i| format!("#pointer_type = :type_{i}"))
                .collect();
            clauses.push(format!("({})", alternatives.join(" OR ")));
        }
        if self.custodian.is_some() {
            clauses.push("custodian = :custodian".to_string());
        }
        if self.nhs_number.is_some() {
            clauses.push("nhs_number = :nhs_number".to_string());
        }

        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }

    /// `ExpressionAttributeNames`. Only the type filter needs an alias:
    /// `type` is a reserved word in the store's expression language.
    pub fn expression_attribute_names(&self) -> Option<HashMap<String, String>> {
        (!self.pointer_types.is_empty()).then(|| {
            HashMap::from([("#pointer_type".to_string(), "type".to_string())])
        })
    }

    /// `ExpressionAttributeValues` covering the key condition and all filters.
    pub fn expression_attribute_values(&self) -> HashMap<String, AttributeValue> {
        let mut values = HashMap::from([(
            ":pk".to_string(),
            AttributeValue::S(self.partition_key.clone()),
        )]);

        for (i, pointer_type) in self.pointer_types.iter().enumerate() {
            values.insert(
                format!(":type_{i}"),
                AttributeValue::S(pointer_type.clone()),
            );
        }
        if let Some(custodian) = &self.custodian {
            values.insert(
                ":custodian".to_string(),
                AttributeValue::S(custodian.clone()),
            );
        }
        if let Some(nhs_number) = &self.nhs_number {
            values.insert(
                ":nhs_number".to_string(),
                AttributeValue::S(nhs_number.clone()),
            );
        }

        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_query_without_filters() {
        let query = SearchQuery::for_patient("9278693472");
        assert_eq!(query.index_name(), "idx_gsi_1");
        assert_eq!(query.key_condition_expression(), "pk_1 = :pk");
        assert_eq!(query.filter_expression(), None);
        assert_eq!(query.expression_attribute_names(), None);

        let values = query.expression_attribute_values();
        assert_eq!(
            values.get(":pk"),
            Some(&AttributeValue::S("P#9278693472".to_string()))
        );
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_patient_query_with_type_and_custodian_filters() {
        let query = SearchQuery::for_patient("9278693472")
            .with_pointer_types(["sys|a", "sys|b"])
            .with_custodian("Y05868");

        assert_eq!(
            query.filter_expression().unwrap(),
            "(#pointer_type = :type_0 OR #pointer_type = :type_1) AND custodian = :custodian"
        );
        assert_eq!(
            query.expression_attribute_names().unwrap(),
            HashMap::from([("#pointer_type".to_string(), "type".to_string())])
        );

        let values = query.expression_attribute_values();
        assert_eq!(
            values.get(":type_1"),
            Some(&AttributeValue::S("sys|b".to_string()))
        );
        assert_eq!(
            values.get(":custodian"),
            Some(&AttributeValue::S("Y05868".to_string()))
        );
    }

    #[test]
    fn test_custodian_query_with_suffix_and_nhs_filter() {
        let query = SearchQuery::for_custodian("Y05868", Some("CBS")).with_nhs_number("9278693472");

        assert_eq!(query.index_name(), "idx_gsi_2");
        assert_eq!(query.partition_key(), "O#Y05868#CBS");
        assert_eq!(query.key_condition_expression(), "pk_2 = :pk");
        assert_eq!(
            query.filter_expression().unwrap(),
            "nhs_number = :nhs_number"
        );
    }
}
