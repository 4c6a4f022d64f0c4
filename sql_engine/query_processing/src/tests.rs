// Copyright 2020 - present Alex Dukhno
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::*;
use definition::ColumnDef;
use query_ast::Value;

fn orders() -> TableDef {
    TableDef::new(
        "orders".to_owned(),
        vec![
            ColumnDef::new("id", SqlType::Int, true),
            ColumnDef::new("label", SqlType::char(10), true),
            ColumnDef::new("placed", SqlType::Date, true),
        ],
        vec![vec!["id".to_owned()]],
        vec![],
    )
    .unwrap()
}

fn clients() -> TableDef {
    TableDef::new(
        "clients".to_owned(),
        vec![ColumnDef::new("id", SqlType::Int, true)],
        vec![vec!["id".to_owned()]],
        vec![],
    )
    .unwrap()
}

#[rstest::fixture]
fn view() -> View {
    let mut view = View::new();
    view.extend_with_table("o", &orders());
    view.extend_with_table("c", &clients());
    view
}

fn comparison(left: Operand, op: Operator, right: Operand) -> WhereExpr {
    WhereExpr::Comparison { left, right, op }
}

fn column(ident: Ident) -> Operand {
    Operand::Column(ident)
}

fn int(value: i64) -> Operand {
    Operand::Literal(Value::Int(value))
}

fn string(value: &str) -> Operand {
    Operand::Literal(Value::String(value.to_owned()))
}

#[cfg(test)]
mod resolution {
    use super::*;

    #[rstest::rstest]
    fn qualified_lookup(view: View) {
        assert_eq!(view.find(&Ident::qualified("o", "ID")).unwrap().column(), "id");
    }

    #[rstest::rstest]
    fn unknown_alias(view: View) {
        assert_eq!(
            view.find(&Ident::qualified("missing", "id")),
            Err(ResolutionError::TableNotSpecified)
        );
    }

    #[rstest::rstest]
    fn unknown_column(view: View) {
        assert_eq!(view.find(&Ident::new("missing")), Err(ResolutionError::ColumnNotExist));
    }

    #[rstest::rstest]
    fn unqualified_name_in_two_tables(view: View) {
        assert_eq!(view.find(&Ident::new("id")), Err(ResolutionError::AmbiguousReference));
    }

    #[rstest::rstest]
    fn unqualified_name_defined_once(view: View) {
        assert_eq!(view.find(&Ident::new("label")).unwrap().alias(), "o");
    }
}

#[cfg(test)]
mod validation {
    use super::*;

    #[rstest::rstest]
    fn classes_must_match(view: View) {
        let checker = TypeChecker::new(&view);
        assert_eq!(
            checker.validate(&comparison(column(Ident::qualified("o", "id")), Operator::Eq, string("x"))),
            Err(WhereError::Incomparable)
        );
    }

    #[rstest::rstest]
    fn ordering_needs_int_or_date(view: View) {
        let checker = TypeChecker::new(&view);
        assert_eq!(
            checker.validate(&comparison(
                column(Ident::qualified("o", "label")),
                Operator::Lt,
                string("x")
            )),
            Err(WhereError::Incomparable)
        );
        assert_eq!(
            checker.validate(&comparison(column(Ident::qualified("o", "id")), Operator::Lt, int(1))),
            Ok(())
        );
    }

    #[rstest::rstest]
    fn equality_works_for_chars(view: View) {
        let checker = TypeChecker::new(&view);
        assert_eq!(
            checker.validate(&comparison(
                column(Ident::qualified("o", "label")),
                Operator::NotEq,
                string("x")
            )),
            Ok(())
        );
    }

    #[rstest::rstest]
    fn resolution_failures_surface(view: View) {
        let checker = TypeChecker::new(&view);
        assert_eq!(
            checker.validate(&WhereExpr::IsNull(Ident::new("id"))),
            Err(WhereError::AmbiguousReference)
        );
        assert_eq!(
            checker.validate(&comparison(column(Ident::new("missing")), Operator::Eq, int(1))),
            Err(WhereError::ColumnNotExist)
        );
    }

    #[rstest::rstest]
    fn nested_trees_are_walked(view: View) {
        let checker = TypeChecker::new(&view);
        let tree = WhereExpr::And(vec![
            WhereExpr::Nop,
            WhereExpr::Not(Box::new(comparison(
                column(Ident::qualified("o", "id")),
                Operator::Eq,
                string("x"),
            ))),
        ]);
        assert_eq!(checker.validate(&tree), Err(WhereError::Incomparable));
    }
}

#[cfg(test)]
mod evaluation {
    use super::*;

    fn record() -> QualRecord {
        QualRecord::from_table_row(
            "o",
            &orders(),
            vec![
                Datum::Int(7),
                Datum::from_string("book"),
                Datum::Null,
            ],
        )
    }

    #[test]
    fn comparisons_over_values() {
        assert!(evaluate(
            &comparison(column(Ident::new("id")), Operator::Gt, int(5)),
            &record()
        ));
        assert!(!evaluate(
            &comparison(column(Ident::new("id")), Operator::LtEq, int(5)),
            &record()
        ));
        assert!(evaluate(
            &comparison(column(Ident::new("label")), Operator::Eq, string("book")),
            &record()
        ));
    }

    #[test]
    fn null_operand_makes_comparison_false() {
        let placed = column(Ident::new("placed"));
        let date = Operand::Literal(Value::Date(chrono::NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()));
        assert!(!evaluate(&comparison(placed.clone(), Operator::Eq, date.clone()), &record()));
        assert!(!evaluate(&comparison(placed, Operator::NotEq, date), &record()));
    }

    #[test]
    fn is_null_observes_null() {
        assert!(evaluate(&WhereExpr::IsNull(Ident::new("placed")), &record()));
        assert!(!evaluate(&WhereExpr::IsNull(Ident::new("id")), &record()));
    }

    #[test]
    fn not_flips_its_child() {
        let null_check = WhereExpr::IsNull(Ident::new("id"));
        assert!(evaluate(&WhereExpr::Not(Box::new(null_check)), &record()));
        // the child is false because of a NULL operand; NOT still flips it
        let date = Operand::Literal(Value::Date(chrono::NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()));
        let null_comparison = comparison(column(Ident::new("placed")), Operator::Lt, date);
        assert!(!evaluate(&null_comparison, &record()));
        assert!(evaluate(&WhereExpr::Not(Box::new(null_comparison)), &record()));
    }

    #[test]
    fn and_or_collapse_to_two_values() {
        let yes = comparison(column(Ident::new("id")), Operator::Eq, int(7));
        let no = comparison(column(Ident::new("id")), Operator::Eq, int(8));
        assert!(evaluate(&WhereExpr::And(vec![yes.clone(), WhereExpr::Nop]), &record()));
        assert!(!evaluate(&WhereExpr::And(vec![yes.clone(), no.clone()]), &record()));
        assert!(evaluate(&WhereExpr::Or(vec![no.clone(), yes]), &record()));
        assert!(!evaluate(&WhereExpr::Or(vec![no.clone(), no]), &record()));
    }

    #[test]
    fn union_spans_tables() {
        let left = record();
        let right = QualRecord::from_table_row("c", &clients(), vec![Datum::Int(1)]);
        let combined = QualRecord::union(vec![&left, &right]);
        assert_eq!(combined.find(&Ident::qualified("c", "id")), Some(&Datum::Int(1)));
        assert_eq!(combined.find(&Ident::qualified("o", "id")), Some(&Datum::Int(7)));
        assert_eq!(combined.values().len(), 4);
    }
}
