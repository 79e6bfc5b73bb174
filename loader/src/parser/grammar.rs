//! Recursive-descent block parser over the token stream.

use super::ParseError;
use super::ast::{
    Argument, Arity, Attribute, Block, ConfigBlock, ConfigProperty, EnumBlock, EnumValueDecl,
    Expr, FieldDecl, FieldType, ModelBlock,
};
use super::lexer::{Token, TokenKind};

/// Parses a token stream into top-level blocks, in source order.
pub fn parse_blocks(tokens: &[Token]) -> Result<Vec<Block>, ParseError> {
    Grammar::new(tokens).blocks()
}

struct Grammar<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Grammar<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn advance(&mut self) -> Option<&'a TokenKind> {
        let kind = self.peek();
        if kind.is_some() {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, expected: &TokenKind) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::Syntax {
            line: self.line(),
            message: message.into(),
        })
    }

    fn expect(&mut self, expected: &TokenKind, what: &str) -> Result<(), ParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            self.error(format!("expected {what}, found {}", describe(self.peek())))
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek() {
            Some(TokenKind::Ident(name)) => {
                self.pos += 1;
                Ok(name.clone())
            }
            other => self.error(format!("expected {what}, found {}", describe(other))),
        }
    }

    /// Consumes the end of an item line. A closing brace also ends the item
    /// but is left for the block loop.
    fn end_of_item(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            None | Some(TokenKind::RBrace) => Ok(()),
            Some(TokenKind::Newline) => {
                self.pos += 1;
                Ok(())
            }
            other => self.error(format!("expected end of line, found {}", describe(other))),
        }
    }

    fn blocks(&mut self) -> Result<Vec<Block>, ParseError> {
        let mut blocks = Vec::new();
        let mut docs = Vec::new();

        loop {
            match self.peek() {
                None => break,
                Some(TokenKind::Newline) => {
                    self.pos += 1;
                }
                Some(TokenKind::DocComment(text)) => {
                    docs.push(text.clone());
                    self.pos += 1;
                }
                Some(TokenKind::Ident(keyword)) => {
                    let line = self.line();
                    let documentation = take_docs(&mut docs);
                    self.pos += 1;
                    let block = match keyword.as_str() {
                        "model" => Block::Model(self.model(false, documentation, line)?),
                        "view" => Block::Model(self.model(true, documentation, line)?),
                        "enum" => Block::Enum(self.enumeration(documentation, line)?),
                        "datasource" => Block::Datasource(self.config(line)?),
                        "generator" => Block::Generator(self.config(line)?),
                        other => {
                            return Err(ParseError::UnsupportedBlock {
                                keyword: other.to_string(),
                                line,
                            });
                        }
                    };
                    blocks.push(block);
                }
                other => {
                    return self.error(format!("expected a block, found {}", describe(other)));
                }
            }
        }

        Ok(blocks)
    }

    fn open_block(&mut self, what: &str) -> Result<String, ParseError> {
        let name = self.ident(&format!("{what} name"))?;
        self.expect(&TokenKind::LBrace, "`{`")?;
        Ok(name)
    }

    fn model(
        &mut self,
        is_view: bool,
        documentation: Option<String>,
        line: usize,
    ) -> Result<ModelBlock, ParseError> {
        let name = self.open_block(if is_view { "view" } else { "model" })?;
        let mut block = ModelBlock {
            name,
            is_view,
            fields: Vec::new(),
            attributes: Vec::new(),
            documentation,
            line,
        };
        let mut docs = Vec::new();

        loop {
            match self.peek() {
                None => return self.error(format!("unclosed block `{}`", block.name)),
                Some(TokenKind::RBrace) => {
                    self.pos += 1;
                    break;
                }
                Some(TokenKind::Newline) => {
                    self.pos += 1;
                }
                Some(TokenKind::DocComment(text)) => {
                    docs.push(text.clone());
                    self.pos += 1;
                }
                Some(TokenKind::AtAt) => {
                    self.pos += 1;
                    block.attributes.push(self.attribute()?);
                    self.end_of_item()?;
                }
                Some(TokenKind::Ident(_)) => {
                    let documentation = take_docs(&mut docs);
                    block.fields.push(self.field(documentation)?);
                }
                other => {
                    return self.error(format!("expected a field, found {}", describe(other)));
                }
            }
        }

        Ok(block)
    }

    fn field(&mut self, documentation: Option<String>) -> Result<FieldDecl, ParseError> {
        let line = self.line();
        let name = self.ident("field name")?;
        let type_name = self.ident("field type")?;

        let field_type = if type_name == "Unsupported" && self.peek() == Some(&TokenKind::LParen) {
            self.pos += 1;
            let db_type = match self.advance() {
                Some(TokenKind::Str(value)) => value.clone(),
                other => {
                    return self.error(format!(
                        "expected a string in Unsupported(..), found {}",
                        describe(other)
                    ));
                }
            };
            self.expect(&TokenKind::RParen, "`)`")?;
            FieldType::Unsupported(db_type)
        } else {
            FieldType::Named(type_name)
        };

        let arity = if self.eat(&TokenKind::Question) {
            Arity::Optional
        } else if self.peek() == Some(&TokenKind::LBracket)
            && self.peek_at(1) == Some(&TokenKind::RBracket)
        {
            self.pos += 2;
            Arity::List
        } else {
            Arity::Required
        };

        let mut attributes = Vec::new();
        while self.eat(&TokenKind::At) {
            attributes.push(self.attribute()?);
        }

        let mut documentation = documentation;
        if let Some(TokenKind::DocComment(text)) = self.peek() {
            if documentation.is_none() {
                documentation = Some(text.clone());
            }
            self.pos += 1;
        }
        self.end_of_item()?;

        Ok(FieldDecl {
            name,
            field_type,
            arity,
            attributes,
            documentation,
            line,
        })
    }

    /// Parses an attribute after its `@` or `@@` marker.
    fn attribute(&mut self) -> Result<Attribute, ParseError> {
        let line = self.line();
        let name = self.ident("attribute name")?;
        let args = if self.peek() == Some(&TokenKind::LParen) {
            self.arguments()?
        } else {
            Vec::new()
        };
        Ok(Attribute { name, args, line })
    }

    fn arguments(&mut self) -> Result<Vec<Argument>, ParseError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();

        while !self.eat(&TokenKind::RParen) {
            let name = match (self.peek(), self.peek_at(1)) {
                (Some(TokenKind::Ident(name)), Some(TokenKind::Colon)) => {
                    self.pos += 2;
                    Some(name.clone())
                }
                _ => None,
            };
            let value = self.expr()?;
            args.push(Argument { name, value });

            if !self.eat(&TokenKind::Comma) && self.peek() != Some(&TokenKind::RParen) {
                return self.error(format!("expected `,` or `)`, found {}", describe(self.peek())));
            }
        }

        Ok(args)
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Some(TokenKind::Str(value)) => Ok(Expr::Str(value.clone())),
            Some(TokenKind::Number(value)) => Ok(Expr::Number(value.clone())),
            Some(TokenKind::Ident(name)) => {
                if self.peek() == Some(&TokenKind::LParen) {
                    let args = self.arguments()?;
                    Ok(Expr::Call {
                        name: name.clone(),
                        args,
                    })
                } else {
                    Ok(Expr::Ident(name.clone()))
                }
            }
            Some(TokenKind::LBracket) => {
                let mut items = Vec::new();
                while !self.eat(&TokenKind::RBracket) {
                    items.push(self.expr()?);
                    if !self.eat(&TokenKind::Comma) && self.peek() != Some(&TokenKind::RBracket) {
                        return self.error(format!(
                            "expected `,` or `]`, found {}",
                            describe(self.peek())
                        ));
                    }
                }
                Ok(Expr::Array(items))
            }
            other => {
                // Report at the offending token, not the one after it.
                self.pos = self.pos.saturating_sub(usize::from(other.is_some()));
                self.error(format!("expected a value, found {}", describe(other)))
            }
        }
    }

    fn enumeration(
        &mut self,
        documentation: Option<String>,
        line: usize,
    ) -> Result<EnumBlock, ParseError> {
        let name = self.open_block("enum")?;
        let mut block = EnumBlock {
            name,
            values: Vec::new(),
            attributes: Vec::new(),
            documentation,
            line,
        };

        loop {
            match self.peek() {
                None => return self.error(format!("unclosed block `{}`", block.name)),
                Some(TokenKind::RBrace) => {
                    self.pos += 1;
                    break;
                }
                Some(TokenKind::Newline | TokenKind::DocComment(_)) => {
                    self.pos += 1;
                }
                Some(TokenKind::AtAt) => {
                    self.pos += 1;
                    block.attributes.push(self.attribute()?);
                    self.end_of_item()?;
                }
                Some(TokenKind::Ident(value)) => {
                    let line = self.line();
                    self.pos += 1;
                    let mut attributes = Vec::new();
                    while self.eat(&TokenKind::At) {
                        attributes.push(self.attribute()?);
                    }
                    self.eat(&TokenKind::Comma);
                    if matches!(self.peek(), Some(TokenKind::DocComment(_))) {
                        self.pos += 1;
                    }
                    self.end_of_item()?;
                    block.values.push(EnumValueDecl {
                        name: value.clone(),
                        attributes,
                        line,
                    });
                }
                other => {
                    return self.error(format!("expected an enum value, found {}", describe(other)));
                }
            }
        }

        Ok(block)
    }

    fn config(&mut self, line: usize) -> Result<ConfigBlock, ParseError> {
        let name = self.open_block("block")?;
        let mut properties = Vec::new();

        loop {
            match self.peek() {
                None => return self.error(format!("unclosed block `{name}`")),
                Some(TokenKind::RBrace) => {
                    self.pos += 1;
                    break;
                }
                Some(TokenKind::Newline | TokenKind::DocComment(_)) => {
                    self.pos += 1;
                }
                Some(TokenKind::Ident(key)) => {
                    let line = self.line();
                    self.pos += 1;
                    self.expect(&TokenKind::Equals, "`=`")?;
                    let value = self.expr()?;
                    self.end_of_item()?;
                    properties.push(ConfigProperty {
                        key: key.clone(),
                        value,
                        line,
                    });
                }
                other => {
                    return self.error(format!("expected a property, found {}", describe(other)));
                }
            }
        }

        Ok(ConfigBlock {
            name,
            properties,
            line,
        })
    }
}

fn take_docs(docs: &mut Vec<String>) -> Option<String> {
    if docs.is_empty() {
        None
    } else {
        Some(std::mem::take(docs).join("\n"))
    }
}

fn describe(kind: Option<&TokenKind>) -> String {
    match kind {
        None => "end of input".to_string(),
        Some(TokenKind::Ident(name)) => format!("`{name}`"),
        Some(TokenKind::Str(value)) => format!("string \"{value}\""),
        Some(TokenKind::Number(value)) => format!("number {value}"),
        Some(TokenKind::DocComment(_)) => "documentation comment".to_string(),
        Some(TokenKind::Newline) => "end of line".to_string(),
        Some(TokenKind::LBrace) => "`{`".to_string(),
        Some(TokenKind::RBrace) => "`}`".to_string(),
        Some(TokenKind::LParen) => "`(`".to_string(),
        Some(TokenKind::RParen) => "`)`".to_string(),
        Some(TokenKind::LBracket) => "`[`".to_string(),
        Some(TokenKind::RBracket) => "`]`".to_string(),
        Some(TokenKind::Comma) => "`,`".to_string(),
        Some(TokenKind::Colon) => "`:`".to_string(),
        Some(TokenKind::Equals) => "`=`".to_string(),
        Some(TokenKind::Question) => "`?`".to_string(),
        Some(TokenKind::At) => "`@`".to_string(),
        Some(TokenKind::AtAt) => "`@@`".to_string(),
    }
}
