//! JVM descriptor and generic signature parsing.
//!
//! Both forms decode to erased, dotted type names:
//!
//! | Input | Parsed |
//! |---|---|
//! | `I` | `int` |
//! | `[Ljava/lang/String;` | `java.lang.String[]` |
//! | `Ljava/util/Map$Entry;` | `java.util.Map.Entry` |
//! | `Ljava/util/List<+TT;>;` | `java.util.List` |
//! | `TT;` | `T` |
//!
//! Formal type parameters (`<T:Ljava/lang/Object;>`) and thrown types (`^TE;`) of
//! generic method signatures are skipped.

use thiserror::Error;

/// A descriptor that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed descriptor {descriptor:?} at offset {position}")]
pub struct DescriptorError {
    /// The descriptor text.
    pub descriptor: String,
    /// Byte offset of the first unexpected character.
    pub position: usize,
}

/// An erased Java type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaType {
    /// Dotted element type name: a primitive, a class or a type variable.
    pub name: String,
    /// Array dimensions.
    pub dims: usize,
}

impl JavaType {
    /// Simple name with array brackets (`String[]`).
    pub fn simple_name(&self) -> String {
        let simple = self
            .name
            .rsplit_once('.')
            .map_or(self.name.as_str(), |(_, simple)| simple);
        format!("{simple}{}", "[]".repeat(self.dims))
    }

    /// Qualification of the element type, if it has one.
    pub fn qualification(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(qualification, _)| qualification)
    }

    /// Qualified name with array brackets (`java.lang.String[]`).
    pub fn qualified_name(&self) -> String {
        format!("{}{}", self.name, "[]".repeat(self.dims))
    }
}

/// Parameter and return types of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Parameter types in declaration order.
    pub parameters: Vec<JavaType>,
    /// Return type; `void` for constructors.
    pub return_type: JavaType,
}

/// Parses a method descriptor or generic method signature.
pub fn parse_method_descriptor(text: &str) -> Result<MethodDescriptor, DescriptorError> {
    let mut cursor = Cursor::new(text);
    if cursor.peek() == Some(b'<') {
        cursor.skip_type_parameters()?;
    }
    cursor.expect(b'(')?;
    let mut parameters = Vec::new();
    while cursor.peek() != Some(b')') {
        parameters.push(cursor.parse_type()?);
    }
    cursor.expect(b')')?;
    let return_type = cursor.parse_type()?;
    while cursor.peek() == Some(b'^') {
        cursor.bump();
        cursor.parse_type()?;
    }
    cursor.finish()?;
    Ok(MethodDescriptor {
        parameters,
        return_type,
    })
}

/// Parses a field descriptor or generic field signature.
pub fn parse_field_descriptor(text: &str) -> Result<JavaType, DescriptorError> {
    let mut cursor = Cursor::new(text);
    let ty = cursor.parse_type()?;
    cursor.finish()?;
    Ok(ty)
}

/// Byte cursor over a descriptor.
struct Cursor<'a> {
    /// The whole descriptor.
    text: &'a str,
    /// Current byte offset.
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Starts at the beginning of `text`.
    fn new(text: &'a str) -> Self {
        Self { text, position: 0 }
    }

    /// Next byte, if any.
    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.position).copied()
    }

    /// Advances past the next byte.
    fn bump(&mut self) {
        self.position += 1;
    }

    /// Error at the current position.
    fn error(&self) -> DescriptorError {
        DescriptorError {
            descriptor: self.text.to_string(),
            position: self.position,
        }
    }

    /// Consumes `expected` or fails.
    fn expect(&mut self, expected: u8) -> Result<(), DescriptorError> {
        if self.peek() != Some(expected) {
            return Err(self.error());
        }
        self.bump();
        Ok(())
    }

    /// Fails unless the whole input was consumed.
    fn finish(&self) -> Result<(), DescriptorError> {
        if self.position != self.text.len() {
            return Err(self.error());
        }
        Ok(())
    }

    /// Reads identifier bytes up to, not including, any of `stops`.
    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str, DescriptorError> {
        let start = self.position;
        while let Some(byte) = self.peek() {
            if stops.contains(&byte) {
                break;
            }
            self.bump();
        }
        if self.position == start || self.peek().is_none() {
            return Err(self.error());
        }
        Ok(&self.text[start..self.position])
    }

    /// Parses one type.
    fn parse_type(&mut self) -> Result<JavaType, DescriptorError> {
        let mut dims = 0;
        while self.peek() == Some(b'[') {
            dims += 1;
            self.bump();
        }
        let Some(tag) = self.peek() else {
            return Err(self.error());
        };
        let name = match tag {
            b'L' => {
                self.bump();
                self.parse_class_name()?
            }
            b'T' => {
                self.bump();
                let name = self.identifier(b";")?.to_string();
                self.bump();
                name
            }
            _ => {
                let name = primitive_name(tag).ok_or_else(|| self.error())?;
                self.bump();
                name.to_string()
            }
        };
        Ok(JavaType { name, dims })
    }

    /// Parses a class type after its `L`, through the closing `;`, erasing type
    /// arguments.
    fn parse_class_name(&mut self) -> Result<String, DescriptorError> {
        let mut name = String::new();
        loop {
            name.push_str(self.identifier(b";<.")?);
            if self.peek() == Some(b'<') {
                self.skip_type_arguments()?;
            }
            match self.peek() {
                Some(b';') => {
                    self.bump();
                    break;
                }
                Some(b'.') => {
                    self.bump();
                    name.push('$');
                }
                _ => return Err(self.error()),
            }
        }
        Ok(name.replace(['/', '$'], "."))
    }

    /// Skips `<...>` type arguments.
    fn skip_type_arguments(&mut self) -> Result<(), DescriptorError> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            match self.peek() {
                Some(b'*') => self.bump(),
                Some(b'+' | b'-') => {
                    self.bump();
                    self.parse_type()?;
                }
                Some(_) => {
                    self.parse_type()?;
                }
                None => return Err(self.error()),
            }
        }
        self.bump();
        Ok(())
    }

    /// Skips `<T:bound:bound...>` formal type parameters.
    fn skip_type_parameters(&mut self) -> Result<(), DescriptorError> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            self.identifier(b":")?;
            self.bump();
            // The class bound may be empty when only interface bounds follow.
            if !matches!(self.peek(), Some(b':' | b'>')) {
                self.parse_type()?;
            }
            while self.peek() == Some(b':') {
                self.bump();
                self.parse_type()?;
            }
            if self.peek().is_none() {
                return Err(self.error());
            }
        }
        self.bump();
        Ok(())
    }
}

/// Name of a primitive descriptor tag.
fn primitive_name(tag: u8) -> Option<&'static str> {
    Some(match tag {
        b'B' => "byte",
        b'C' => "char",
        b'D' => "double",
        b'F' => "float",
        b'I' => "int",
        b'J' => "long",
        b'S' => "short",
        b'Z' => "boolean",
        b'V' => "void",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn names(descriptor: &MethodDescriptor) -> Vec<String> {
        descriptor
            .parameters
            .iter()
            .map(JavaType::qualified_name)
            .collect()
    }

    #[test]
    fn test_plain_method_descriptor() {
        let descriptor = parse_method_descriptor("(I[Ljava/lang/String;[[J)Ljava/util/List;").unwrap();
        assert_eq!(
            names(&descriptor),
            vec!["int", "java.lang.String[]", "long[][]"]
        );
        assert_eq!(descriptor.return_type.qualified_name(), "java.util.List");
        assert_eq!(descriptor.parameters[1].simple_name(), "String[]");
        assert_eq!(descriptor.parameters[1].qualification(), Some("java.lang"));
        assert_eq!(descriptor.parameters[0].qualification(), None);
    }

    #[test]
    fn test_nested_types_become_dotted() {
        let ty = parse_field_descriptor("Ljava/util/Map$Entry;").unwrap();
        assert_eq!(ty.simple_name(), "Entry");
        assert_eq!(ty.qualification(), Some("java.util.Map"));
    }

    #[test]
    fn test_generic_signature_is_erased() {
        let descriptor = parse_method_descriptor(
            "<K:Ljava/lang/Object;V::Ljava/lang/Comparable<TV;>;>(TK;Ljava/util/Map<+TK;*>.Entry<TV;>;)TV;^Ljava/io/IOException;",
        )
        .unwrap();
        assert_eq!(names(&descriptor), vec!["K", "java.util.Map.Entry"]);
        assert_eq!(descriptor.return_type.qualified_name(), "V");
    }

    #[test]
    fn test_malformed_descriptors_report_position() {
        let err = parse_method_descriptor("(ILjava/lang/String").unwrap_err();
        assert_eq!(err.position, 19);
        assert!(parse_method_descriptor("I)V").is_err());
        assert!(parse_field_descriptor("Q").is_err());
        assert!(parse_field_descriptor("IJ").is_err());
    }
}
