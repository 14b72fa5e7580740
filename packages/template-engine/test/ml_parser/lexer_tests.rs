/**
 * Template Lexer Tests
 *
 * Token forms, priority between forms and text that must not tokenize.
 */

#[path = "../util/mod.rs"]
mod utils;

#[cfg(test)]
mod lexer_tests {
    use super::utils::*;
    use template_engine::ml_parser::lexer::tokenize;
    use template_engine::ml_parser::tokens::{ExpressionKind, TokenKind};

    fn tok(label: &str, text: &str) -> [String; 2] {
        [label.to_string(), text.to_string()]
    }

    mod components {
        use super::*;

        #[test]
        fn should_tokenize_open_and_close_tags() {
            assert_eq!(
                humanize_tokens("<com:Panel>x</com:Panel>"),
                vec![
                    tok("COMPONENT_OPEN", "<com:Panel>"),
                    tok("COMPONENT_CLOSE", "</com:Panel>"),
                ]
            );
        }

        #[test]
        fn should_tokenize_self_closing_tag_with_attributes() {
            assert_eq!(
                humanize_tokens(r#"<com:Btn Text="Hi" onClick='Go' />"#),
                vec![tok("COMPONENT_VOID", r#"<com:Btn Text="Hi" onClick='Go' />"#)]
            );
        }

        #[test]
        fn should_accept_unquoted_expression_values() {
            assert_eq!(
                humanize_tokens("<com:Label Text=<%= $x %> />"),
                vec![tok("COMPONENT_VOID", "<com:Label Text=<%= $x %> />")]
            );
        }

        #[test]
        fn should_expose_dotted_type_names_and_attribute_span() {
            let source = r#"<com:System.Web.Label Text="a">"#;
            let tokens = tokenize(source);
            match tokens[0].kind {
                TokenKind::ComponentOpen {
                    type_name,
                    attributes,
                    self_closing,
                } => {
                    assert_eq!(type_name, "System.Web.Label");
                    assert_eq!(attributes.slice(source), r#" Text="a""#);
                    assert!(!self_closing);
                }
                other => panic!("unexpected token {:?}", other),
            }
        }

        #[test]
        fn should_leave_malformed_tags_as_text() {
            assert!(humanize_tokens("<com:Btn Text=bare>").is_empty());
            assert!(humanize_tokens("<com: >").is_empty());
            assert!(humanize_tokens("a < b").is_empty());
        }
    }

    mod directives_and_expressions {
        use super::*;

        #[test]
        fn should_tokenize_directive() {
            assert_eq!(
                humanize_tokens(r#"<%@ Title="Home" MasterClass="Layout" %>"#),
                vec![tok("DIRECTIVE", r#"<%@ Title="Home" MasterClass="Layout" %>"#)]
            );
        }

        #[test]
        fn should_select_expression_kind_by_marker() {
            let source = "<%= a %><%% b %><%# c %><%$ d %><%~ e %><%/ f %><%[ g ]%>";
            let kinds: Vec<(ExpressionKind, String)> = tokenize(source)
                .iter()
                .filter_map(|token| match token.kind {
                    TokenKind::Expression { kind, body } => Some((kind, body.slice(source).trim().to_string())),
                    _ => None,
                })
                .collect();
            assert_eq!(
                kinds,
                vec![
                    (ExpressionKind::Expression, "a".to_string()),
                    (ExpressionKind::Statements, "b".to_string()),
                    (ExpressionKind::DataBinding, "c".to_string()),
                    (ExpressionKind::Parameter, "d".to_string()),
                    (ExpressionKind::Asset, "e".to_string()),
                    (ExpressionKind::SitePath, "f".to_string()),
                    (ExpressionKind::Localization, "g".to_string()),
                ]
            );
        }

        #[test]
        fn should_report_byte_offsets() {
            let tokens = tokenize("ab<%= x %>cd");
            assert_eq!(tokens.len(), 1);
            assert_eq!(tokens[0].span.start, 2);
            assert_eq!(tokens[0].span.end, 10);
        }

        #[test]
        fn should_not_treat_unknown_marker_as_expression() {
            assert!(humanize_tokens("<%? x %>").is_empty());
        }
    }

    mod properties {
        use super::*;

        #[test]
        fn should_tokenize_block_property_tags() {
            assert_eq!(
                humanize_tokens("<prop:Title>Hi</prop:Title>"),
                vec![
                    tok("PROPERTY_OPEN", "<prop:Title>"),
                    tok("PROPERTY_CLOSE", "</prop:Title>"),
                ]
            );
        }

        #[test]
        fn should_tokenize_subattribute_property_tag() {
            assert_eq!(
                humanize_tokens(r#"<prop:Font Size="2" Bold="true" />"#),
                vec![tok("PROPERTY_VOID", r#"<prop:Font Size="2" Bold="true" />"#)]
            );
        }

        #[test]
        fn should_not_accept_open_property_tag_with_attributes() {
            assert!(humanize_tokens(r#"<prop:Font Size="2">"#).is_empty());
        }
    }

    mod comments_and_includes {
        use super::*;

        #[test]
        fn should_distinguish_stripped_and_literal_comments() {
            assert_eq!(
                humanize_tokens("<!-- a --!><!--- b ---><!-- c -->"),
                vec![
                    tok("COMMENT_STRIPPED", "<!-- a --!>"),
                    tok("COMMENT_STRIPPED", "<!--- b --->"),
                    tok("COMMENT_LITERAL", "<!-- c -->"),
                ]
            );
        }

        #[test]
        fn should_end_comment_at_earliest_terminator() {
            assert_eq!(
                humanize_tokens("<!-- a --> b --!>"),
                vec![tok("COMMENT_LITERAL", "<!-- a -->")]
            );
        }

        #[test]
        fn should_tokenize_include_marker_on_one_line() {
            assert_eq!(
                humanize_tokens("<%include Application.header %>"),
                vec![tok("INCLUDE", "<%include Application.header %>")]
            );
            assert!(humanize_tokens("<%include Application\n.header %>").is_empty());
        }
    }
}
