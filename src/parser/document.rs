//! Grammar productions: document -> [`crate::ast::Document`].
//!
//! Grounded on the teacher's `parser/document.rs` grammar shape, rewritten against
//! our non-generic [`crate::ast::InputValue`]/[`crate::ast::Type`].

use indexmap::IndexMap;

use crate::ast::{
    Directive, Document, Field, FragmentDefinition, FragmentSpread, InlineFragment, InputValue,
    OperationDefinition, OperationType, Selection, Span, Spanning, Type, VariableDefinition,
};

use super::lexer::Token;
use super::parser_impl::{PResult, ParseError, Parser};

pub(super) fn parse(source: &str) -> Result<Document, Spanning<ParseError>> {
    let mut parser = Parser::new(source)?;
    let mut operations = Vec::new();
    let mut fragments = IndexMap::new();

    while !parser.at_eof() {
        let start = parser.peek_start();
        let tok = parser.peek().clone();
        if is_operation_start(&tok) {
            let op = parse_operation(&mut parser)?;
            operations.push(op);
        } else if matches!(&tok, Token::Name(n) if n == "fragment") {
            let frag = parse_fragment_definition(&mut parser)?;
            fragments.insert(frag.item.name.clone(), frag);
        } else {
            return Err(Spanning::zero_width(start, ParseError::UnexpectedToken(tok)));
        }
    }

    Ok(Document {
        operations,
        fragments,
    })
}

fn is_operation_start(tok: &Token) -> bool {
    matches!(tok, Token::BraceOpen)
        || matches!(tok, Token::Name(n) if n == "query" || n == "mutation" || n == "subscription")
}

fn parse_operation(parser: &mut Parser<'_>) -> PResult<Spanning<OperationDefinition>> {
    let start = parser.peek_start();

    if *parser.peek() == Token::BraceOpen {
        let selection_set = parse_selection_set(parser)?;
        let end = selection_set.last().map(|s| s.end).unwrap_or(start);
        return Ok(Spanning::start_end(
            start,
            end,
            OperationDefinition {
                operation_type: OperationType::Query,
                name: None,
                variable_definitions: Vec::new(),
                directives: Vec::new(),
                selection_set,
            },
        ));
    }

    let operation_type = match parser.next()?.item {
        Token::Name(n) if n == "query" => OperationType::Query,
        Token::Name(n) if n == "mutation" => OperationType::Mutation,
        Token::Name(n) if n == "subscription" => OperationType::Subscription,
        other => return Err(Spanning::zero_width(start, ParseError::UnexpectedToken(other))),
    };

    let name = match parser.peek().clone() {
        Token::Name(_) => Some(parser.expect_name()?.item),
        _ => None,
    };

    let variable_definitions = parse_variable_definitions(parser)?;
    let directives = parse_directives(parser)?;
    let selection_set = parse_selection_set(parser)?;
    let end = selection_set.last().map(|s| s.end).unwrap_or(start);

    Ok(Spanning::start_end(
        start,
        end,
        OperationDefinition {
            operation_type,
            name,
            variable_definitions,
            directives,
            selection_set,
        },
    ))
}

fn parse_fragment_definition(parser: &mut Parser<'_>) -> PResult<Spanning<FragmentDefinition>> {
    let start = parser.expect(&Token::Name("fragment".into()))?.start;
    let name = parser.expect_name()?;
    if name.item == "on" {
        return Err(name.map(|_| ParseError::UnexpectedToken(Token::Name("on".into()))));
    }
    parser.expect(&Token::Name("on".into()))?;
    let type_condition = parser.expect_name()?.item;
    let directives = parse_directives(parser)?;
    let selection_set = parse_selection_set(parser)?;
    let end = selection_set.last().map(|s| s.end).unwrap_or(start);

    Ok(Spanning::start_end(
        start,
        end,
        FragmentDefinition {
            name: name.item,
            type_condition,
            directives,
            selection_set,
        },
    ))
}

fn parse_variable_definitions(
    parser: &mut Parser<'_>,
) -> PResult<Vec<Spanning<VariableDefinition>>> {
    if *parser.peek() != Token::ParenOpen {
        return Ok(Vec::new());
    }
    parser.next()?;
    let mut defs = Vec::new();
    while *parser.peek() != Token::ParenClose {
        let start = parser.peek_start();
        parser.expect(&Token::Dollar)?;
        let name = parser.expect_name()?.item;
        parser.expect(&Token::Colon)?;
        let var_type = parse_type(parser)?;
        let default_value = if *parser.peek() == Token::Equals {
            parser.next()?;
            Some(parse_value_literal(parser)?)
        } else {
            None
        };
        let end = default_value
            .as_ref()
            .map(|v| v.end)
            .unwrap_or_else(|| var_type.end);
        defs.push(Spanning::start_end(
            start,
            end,
            VariableDefinition {
                name,
                var_type,
                default_value,
            },
        ));
    }
    parser.next()?;
    Ok(defs)
}

fn parse_type(parser: &mut Parser<'_>) -> PResult<Spanning<Type>> {
    let start = parser.peek_start();
    let mut ty = if *parser.peek() == Token::BracketOpen {
        parser.next()?;
        let inner = parse_type(parser)?;
        parser.expect(&Token::BracketClose)?;
        Type::List(Box::new(inner.item))
    } else {
        Type::Named(parser.expect_name()?.item)
    };
    let mut end = parser.peek_start();
    if *parser.peek() == Token::Bang {
        parser.next()?;
        ty = Type::NonNull(Box::new(ty));
        end = parser.peek_start();
    }
    Ok(Spanning::start_end(start, end, ty))
}

fn parse_directives(parser: &mut Parser<'_>) -> PResult<Vec<Spanning<Directive>>> {
    let mut dirs = Vec::new();
    while *parser.peek() == Token::At {
        let start = parser.next()?.start;
        let name = parser.expect_name()?.item;
        let arguments = parse_arguments(parser)?;
        let end = parser.peek_start();
        dirs.push(Spanning::start_end(start, end, Directive { name, arguments }));
    }
    Ok(dirs)
}

fn parse_arguments(
    parser: &mut Parser<'_>,
) -> PResult<Vec<(Spanning<String>, Spanning<InputValue>)>> {
    if *parser.peek() != Token::ParenOpen {
        return Ok(Vec::new());
    }
    parser.next()?;
    let mut args = Vec::new();
    while *parser.peek() != Token::ParenClose {
        let name = parser.expect_name()?;
        parser.expect(&Token::Colon)?;
        let value = parse_value_literal(parser)?;
        args.push((name, value));
    }
    parser.next()?;
    Ok(args)
}

fn parse_selection_set(parser: &mut Parser<'_>) -> PResult<Vec<Spanning<Selection>>> {
    parser.expect(&Token::BraceOpen)?;
    let mut sels = Vec::new();
    while *parser.peek() != Token::BraceClose {
        sels.push(parse_selection(parser)?);
    }
    parser.next()?;
    Ok(sels)
}

fn parse_selection(parser: &mut Parser<'_>) -> PResult<Spanning<Selection>> {
    let start = parser.peek_start();
    if *parser.peek() == Token::Ellipsis {
        parser.next()?;
        return parse_fragment_or_inline(parser, start);
    }

    let first = parser.expect_name()?;
    let (alias, name) = if *parser.peek() == Token::Colon {
        parser.next()?;
        let name = parser.expect_name()?.item;
        (Some(first.item), name)
    } else {
        (None, first.item)
    };

    let arguments = parse_arguments(parser)?;
    let directives = parse_directives(parser)?;
    let selection_set = if *parser.peek() == Token::BraceOpen {
        parse_selection_set(parser)?
    } else {
        Vec::new()
    };
    let end = parser.peek_start();

    Ok(Spanning::start_end(
        start,
        end,
        Selection::Field(Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
        }),
    ))
}

fn parse_fragment_or_inline(parser: &mut Parser<'_>, start: Span) -> PResult<Spanning<Selection>> {
    let is_on = parser.skip_keyword("on")?;
    if is_on {
        let type_condition = Some(parser.expect_name()?.item);
        let directives = parse_directives(parser)?;
        let selection_set = parse_selection_set(parser)?;
        let end = parser.peek_start();
        return Ok(Spanning::start_end(
            start,
            end,
            Selection::InlineFragment(InlineFragment {
                type_condition,
                directives,
                selection_set,
            }),
        ));
    }

    if let Token::Name(_) = parser.peek() {
        let name = parser.expect_name()?.item;
        let directives = parse_directives(parser)?;
        let end = parser.peek_start();
        return Ok(Spanning::start_end(
            start,
            end,
            Selection::FragmentSpread(FragmentSpread { name, directives }),
        ));
    }

    // Untyped inline fragment: `... { ... }`.
    let directives = parse_directives(parser)?;
    let selection_set = parse_selection_set(parser)?;
    let end = parser.peek_start();
    Ok(Spanning::start_end(
        start,
        end,
        Selection::InlineFragment(InlineFragment {
            type_condition: None,
            directives,
            selection_set,
        }),
    ))
}

pub(super) fn parse_value_literal(parser: &mut Parser<'_>) -> PResult<Spanning<InputValue>> {
    let start = parser.peek_start();
    let tok = parser.next()?;
    let value = match tok.item {
        Token::Dollar => InputValue::Variable(parser.expect_name()?.item),
        Token::Int(i) => InputValue::Int(i),
        Token::Float(f) => InputValue::Float(f),
        Token::Str(s) => InputValue::String(s),
        Token::Name(n) if n == "true" => InputValue::Boolean(true),
        Token::Name(n) if n == "false" => InputValue::Boolean(false),
        Token::Name(n) if n == "null" => InputValue::Null,
        Token::Name(n) => InputValue::Enum(n),
        Token::BracketOpen => {
            let mut items = Vec::new();
            while *parser.peek() != Token::BracketClose {
                items.push(parse_value_literal(parser)?);
            }
            parser.next()?;
            InputValue::List(items)
        }
        Token::BraceOpen => {
            let mut fields = Vec::new();
            while *parser.peek() != Token::BraceClose {
                let name = parser.expect_name()?;
                parser.expect(&Token::Colon)?;
                let value = parse_value_literal(parser)?;
                fields.push((name, value));
            }
            parser.next()?;
            InputValue::Object(fields)
        }
        other => return Err(Spanning::zero_width(tok.start, ParseError::UnexpectedToken(other))),
    };
    let end = parser.peek_start();
    Ok(Spanning::start_end(start, end, value))
}
