use std::fmt;

use lather_wsdl::schema::{ComplexType, SchemaSet, SequenceItem, TypeContent};
use lather_wsdl::types::NamespacedName;

use crate::service::{MessageInfo, MessagePartInfo, OperationInfo, UnwrappedOperationInfo};

#[derive(Debug, Clone, Copy, Default)]
pub struct WrappedRules {
    /// Allows multi-part inputs and drops the element-name/operation-name
    /// equality and nillable checks.
    pub relaxed: bool,
    /// Accepts wrapper children that are references to global elements.
    pub follow_refs: bool,
}

#[derive(Debug)]
pub enum WrappedOutcome {
    Wrapped(UnwrappedOperationInfo),
    NotWrapped(NotWrappedReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotWrappedReason {
    NoInput,
    PartCount { side: Side, count: usize },
    PartNotElement { side: Side },
    ElementNotFound { side: Side, element: NamespacedName },
    NameMismatch { element: String, operation: String },
    TypeNotComplex { side: Side },
    HasAttributes { side: Side },
    Nillable,
    NotSequence { side: Side },
    DisallowedChild { side: Side, child: String },
    UnresolvedRef { side: Side, reference: NamespacedName },
    AbstractType,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Input => write!(f, "input"),
            Side::Output => write!(f, "output"),
        }
    }
}

impl fmt::Display for NotWrappedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotWrappedReason::NoInput => write!(f, "operation has no input message"),
            NotWrappedReason::PartCount { side, count } => {
                write!(f, "{} message has {} parts", side, count)
            }
            NotWrappedReason::PartNotElement { side } => {
                write!(f, "{} part does not reference a global element", side)
            }
            NotWrappedReason::ElementNotFound { side, element } => {
                write!(f, "{} element '{}' is not in the schemas", side, element.name)
            }
            NotWrappedReason::NameMismatch { element, operation } => write!(
                f,
                "input element '{}' does not match operation '{}'",
                element, operation
            ),
            NotWrappedReason::TypeNotComplex { side } => {
                write!(f, "{} element's type is not a complex type", side)
            }
            NotWrappedReason::HasAttributes { side } => {
                write!(f, "{} wrapper type declares attributes", side)
            }
            NotWrappedReason::Nillable => write!(f, "input element is nillable"),
            NotWrappedReason::NotSequence { side } => {
                write!(f, "{} wrapper content is not a plain sequence", side)
            }
            NotWrappedReason::DisallowedChild { side, child } => {
                write!(f, "{} wrapper child '{}' is not a local element", side, child)
            }
            NotWrappedReason::UnresolvedRef { side, reference } => write!(
                f,
                "{} wrapper references unknown element '{}'",
                side, reference.name
            ),
            NotWrappedReason::AbstractType => write!(f, "output wrapper type is abstract"),
        }
    }
}

/// The document/literal-wrapped test, in rule order:
///
/// 1. the input message has exactly one part (relaxed: at least one) and the
///    output, if present, at most one;
/// 2. the input part references a global element whose local name equals the
///    operation name (equality waived when relaxed);
/// 3. a single-part output references a global element;
/// 4. the input element's type is a complex type with no attributes (and,
///    unless relaxed, a non-nillable element) whose content is a plain
///    sequence of local elements, directly or through one level of
///    complex-content extension;
/// 5. the same structural test holds for the output element, whose type must
///    additionally not be abstract.
///
/// The first failed rule names the reason; nothing about a `NotWrapped`
/// outcome is fatal, the operation simply gets no unwrapped view.
pub fn check_for_wrapped(
    operation: &OperationInfo,
    schemas: &SchemaSet,
    rules: WrappedRules,
) -> WrappedOutcome {
    use NotWrappedReason::*;
    use WrappedOutcome::NotWrapped;

    let input = match &operation.input {
        Some(input) => input,
        None => return NotWrapped(NoInput),
    };
    let output = operation.output.as_ref();

    // rule 1
    if !(input.parts.len() == 1 || (rules.relaxed && !input.parts.is_empty())) {
        return NotWrapped(PartCount {
            side: Side::Input,
            count: input.parts.len(),
        });
    }
    if let Some(output) = output {
        if output.parts.len() > 1 {
            return NotWrapped(PartCount {
                side: Side::Output,
                count: output.parts.len(),
            });
        }
    }

    // rule 2
    let input_part = &input.parts[0];
    let input_element_name = match &input_part.element {
        Some(element) => element,
        None => return NotWrapped(PartNotElement { side: Side::Input }),
    };
    let input_element = match schemas.element(input_element_name) {
        Some(element) => element,
        None => {
            return NotWrapped(ElementNotFound {
                side: Side::Input,
                element: input_element_name.clone(),
            })
        }
    };
    if !rules.relaxed && input_element.name.name != operation.name {
        return NotWrapped(NameMismatch {
            element: input_element.name.name.clone(),
            operation: operation.name.clone(),
        });
    }

    // rule 3
    let output_element = match output {
        Some(output) if output.parts.len() == 1 => {
            let part = &output.parts[0];
            let name = match &part.element {
                Some(element) => element,
                None => return NotWrapped(PartNotElement { side: Side::Output }),
            };
            match schemas.element(name) {
                Some(element) => Some(element),
                None => {
                    return NotWrapped(ElementNotFound {
                        side: Side::Output,
                        element: name.clone(),
                    })
                }
            }
        }
        _ => None,
    };

    // rule 4
    if !rules.relaxed && input_element.nillable {
        return NotWrapped(Nillable);
    }
    let input_type = match schemas.element_type(input_element) {
        Some(complex_type) => complex_type,
        None => return NotWrapped(TypeNotComplex { side: Side::Input }),
    };
    let input_parts = match wrapper_parts(input_type, schemas, Side::Input, rules) {
        Ok(parts) => parts,
        Err(reason) => return NotWrapped(reason),
    };

    // rule 5
    let output_parts = match output_element {
        Some(element) => {
            let output_type = match schemas.element_type(element) {
                Some(complex_type) => complex_type,
                None => return NotWrapped(TypeNotComplex { side: Side::Output }),
            };
            if output_type.is_abstract {
                return NotWrapped(AbstractType);
            }
            match wrapper_parts(output_type, schemas, Side::Output, rules) {
                Ok(parts) => Some(parts),
                Err(reason) => return NotWrapped(reason),
            }
        }
        None => None,
    };

    let unwrapped_input = MessageInfo {
        name: input_element.name.clone(),
        parts: input_parts,
    };

    let unwrapped_output = match (output, output_element, output_parts) {
        (Some(_), Some(element), Some(parts)) => Some(MessageInfo {
            name: element.name.clone(),
            parts,
        }),
        // an output message with no parts unwraps to an empty message
        (Some(output), None, _) => Some(MessageInfo {
            name: output.name.clone(),
            parts: Vec::new(),
        }),
        _ => None,
    };

    WrappedOutcome::Wrapped(UnwrappedOperationInfo {
        input: unwrapped_input,
        output: unwrapped_output,
    })
}

fn wrapper_parts(
    complex_type: &ComplexType,
    schemas: &SchemaSet,
    side: Side,
    rules: WrappedRules,
) -> Result<Vec<MessagePartInfo>, NotWrappedReason> {
    use NotWrappedReason::*;

    if !complex_type.attributes.is_empty() {
        return Err(HasAttributes { side });
    }

    let items: Vec<&SequenceItem> = match &complex_type.content {
        TypeContent::Empty => Vec::new(),

        TypeContent::Sequence(items) => items.iter().collect(),

        TypeContent::Extension { base, items } => {
            let base_type = schemas.complex_type(base).ok_or(NotSequence { side })?;
            if !base_type.attributes.is_empty() {
                return Err(HasAttributes { side });
            }

            // one level of extension only: the base must be a direct sequence
            let base_items: Vec<&SequenceItem> = match &base_type.content {
                TypeContent::Empty => Vec::new(),
                TypeContent::Sequence(base_items) => base_items.iter().collect(),
                _ => return Err(NotSequence { side }),
            };

            base_items.into_iter().chain(items.iter()).collect()
        }

        TypeContent::Opaque => return Err(NotSequence { side }),
    };

    let mut parts = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match item {
            SequenceItem::Element(local) => parts.push(MessagePartInfo {
                name: local.name.clone(),
                element: None,
                type_name: local.ty.clone(),
                index,
            }),

            SequenceItem::Ref(reference) => {
                if !rules.follow_refs {
                    return Err(DisallowedChild {
                        side,
                        child: reference.name.clone(),
                    });
                }

                let element = schemas.element(reference).ok_or_else(|| UnresolvedRef {
                    side,
                    reference: reference.clone(),
                })?;

                parts.push(MessagePartInfo {
                    name: element.name.name.clone(),
                    element: Some(element.name.clone()),
                    type_name: element.ty.clone(),
                    index,
                });
            }

            SequenceItem::Opaque => {
                return Err(DisallowedChild {
                    side,
                    child: "*".to_owned(),
                })
            }
        }
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Properties;
    use lather_wsdl::parse_str;
    use lather_wsdl::types::Document;

    fn schemas_for(document: &Document) -> SchemaSet {
        SchemaSet::from_definition(&document.definition)
    }

    fn element_named(document: &Document, name: &str) -> NamespacedName {
        document
            .definition
            .schemas
            .iter()
            .flat_map(|schema| &schema.elements)
            .find(|element| element.name.name == name)
            .map(|element| element.name.clone())
            .unwrap_or_else(|| panic!("no element {}", name))
    }

    fn message(document: &Document, local: &str, element: &str) -> MessageInfo {
        let mut namespaces = document.namespaces.clone();
        MessageInfo {
            name: lather_wsdl::types::NamespacedName::new(&mut namespaces, "urn:echo", local.into()),
            parts: vec![MessagePartInfo {
                name: "parameters".into(),
                element: Some(element_named(document, element)),
                type_name: None,
                index: 0,
            }],
        }
    }

    fn operation(document: &Document, name: &str, output: Option<&str>) -> OperationInfo {
        OperationInfo {
            name: name.into(),
            input: Some(message(document, &format!("{}Request", name), name)),
            output: output.map(|element| {
                message(document, &format!("{}Response", name), element)
            }),
            faults: Vec::new(),
            unwrapped: None,
            properties: Properties::new(),
        }
    }

    fn document(schema_body: &str) -> Document {
        parse_str(&format!(
            r#"<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                xmlns:tns="urn:echo" targetNamespace="urn:echo">
              <wsdl:types>
                <xsd:schema targetNamespace="urn:echo">{}</xsd:schema>
              </wsdl:types>
            </wsdl:definitions>"#,
            schema_body
        ))
        .unwrap()
    }

    const WRAPPED_ECHO: &str = r#"
        <xsd:element name="Echo">
          <xsd:complexType>
            <xsd:sequence>
              <xsd:element name="text" type="xsd:string"/>
              <xsd:element name="times" type="xsd:int"/>
            </xsd:sequence>
          </xsd:complexType>
        </xsd:element>
        <xsd:element name="EchoResponse">
          <xsd:complexType>
            <xsd:sequence>
              <xsd:element name="result" type="xsd:string"/>
            </xsd:sequence>
          </xsd:complexType>
        </xsd:element>"#;

    #[test]
    fn detects_the_wrapped_convention() {
        let document = document(WRAPPED_ECHO);
        let schemas = schemas_for(&document);
        let operation = operation(&document, "Echo", Some("EchoResponse"));

        match check_for_wrapped(&operation, &schemas, WrappedRules::default()) {
            WrappedOutcome::Wrapped(unwrapped) => {
                assert_eq!(unwrapped.input.parts.len(), 2);
                assert_eq!(unwrapped.input.parts[0].name, "text");
                assert_eq!(unwrapped.input.parts[1].name, "times");

                let output = unwrapped.output.unwrap();
                assert_eq!(output.parts.len(), 1);
                assert_eq!(output.parts[0].name, "result");
            }
            WrappedOutcome::NotWrapped(reason) => panic!("not wrapped: {}", reason),
        }
    }

    #[test]
    fn attributes_on_the_wrapper_disqualify_it() {
        let document = document(
            r#"
            <xsd:element name="Echo">
              <xsd:complexType>
                <xsd:sequence>
                  <xsd:element name="text" type="xsd:string"/>
                </xsd:sequence>
                <xsd:attribute name="id" type="xsd:string"/>
              </xsd:complexType>
            </xsd:element>"#,
        );
        let schemas = schemas_for(&document);
        let operation = operation(&document, "Echo", None);

        assert!(matches!(
            check_for_wrapped(&operation, &schemas, WrappedRules::default()),
            WrappedOutcome::NotWrapped(NotWrappedReason::HasAttributes { side: Side::Input })
        ));
    }

    #[test]
    fn name_mismatch_fails_strict_but_passes_relaxed() {
        let document = document(
            r#"
            <xsd:element name="EchoRequest">
              <xsd:complexType>
                <xsd:sequence>
                  <xsd:element name="text" type="xsd:string"/>
                </xsd:sequence>
              </xsd:complexType>
            </xsd:element>"#,
        );
        let schemas = schemas_for(&document);

        // input wrapper is named EchoRequest, the operation is Echo
        let operation = OperationInfo {
            name: "Echo".into(),
            input: Some(message(&document, "EchoRequest", "EchoRequest")),
            output: None,
            faults: Vec::new(),
            unwrapped: None,
            properties: Properties::new(),
        };

        assert!(matches!(
            check_for_wrapped(&operation, &schemas, WrappedRules::default()),
            WrappedOutcome::NotWrapped(NotWrappedReason::NameMismatch { .. })
        ));

        let relaxed = WrappedRules {
            relaxed: true,
            ..Default::default()
        };
        assert!(matches!(
            check_for_wrapped(&operation, &schemas, relaxed),
            WrappedOutcome::Wrapped(..)
        ));
    }

    #[test]
    fn nillable_input_elements_fail_strict_mode() {
        let document = document(
            r#"
            <xsd:element name="Echo" nillable="true">
              <xsd:complexType>
                <xsd:sequence/>
              </xsd:complexType>
            </xsd:element>"#,
        );
        let schemas = schemas_for(&document);
        let operation = operation(&document, "Echo", None);

        assert!(matches!(
            check_for_wrapped(&operation, &schemas, WrappedRules::default()),
            WrappedOutcome::NotWrapped(NotWrappedReason::Nillable)
        ));
    }

    #[test]
    fn multi_part_input_fails_unless_relaxed() {
        let document = document(WRAPPED_ECHO);
        let schemas = schemas_for(&document);

        let mut operation = operation(&document, "Echo", None);
        let extra = operation.input.as_ref().unwrap().parts[0].clone();
        operation.input.as_mut().unwrap().parts.push(MessagePartInfo {
            index: 1,
            ..extra
        });

        assert!(matches!(
            check_for_wrapped(&operation, &schemas, WrappedRules::default()),
            WrappedOutcome::NotWrapped(NotWrappedReason::PartCount {
                side: Side::Input,
                count: 2
            })
        ));

        let relaxed = WrappedRules {
            relaxed: true,
            ..Default::default()
        };
        assert!(matches!(
            check_for_wrapped(&operation, &schemas, relaxed),
            WrappedOutcome::Wrapped(..)
        ));
    }

    #[test]
    fn choice_content_is_not_a_wrapper() {
        let document = document(
            r#"
            <xsd:element name="Echo">
              <xsd:complexType>
                <xsd:choice>
                  <xsd:element name="a" type="xsd:string"/>
                  <xsd:element name="b" type="xsd:string"/>
                </xsd:choice>
              </xsd:complexType>
            </xsd:element>"#,
        );
        let schemas = schemas_for(&document);
        let operation = operation(&document, "Echo", None);

        assert!(matches!(
            check_for_wrapped(&operation, &schemas, WrappedRules::default()),
            WrappedOutcome::NotWrapped(NotWrappedReason::NotSequence { side: Side::Input })
        ));
    }

    #[test]
    fn element_refs_require_the_follow_refs_rule() {
        let document = document(
            r#"
            <xsd:element name="text" type="xsd:string"/>
            <xsd:element name="Echo">
              <xsd:complexType>
                <xsd:sequence>
                  <xsd:element ref="tns:text"/>
                </xsd:sequence>
              </xsd:complexType>
            </xsd:element>"#,
        );
        let schemas = schemas_for(&document);
        let operation = operation(&document, "Echo", None);

        assert!(matches!(
            check_for_wrapped(&operation, &schemas, WrappedRules::default()),
            WrappedOutcome::NotWrapped(NotWrappedReason::DisallowedChild { .. })
        ));

        let follow = WrappedRules {
            follow_refs: true,
            ..Default::default()
        };
        match check_for_wrapped(&operation, &schemas, follow) {
            WrappedOutcome::Wrapped(unwrapped) => {
                assert_eq!(unwrapped.input.parts.len(), 1);
                assert_eq!(unwrapped.input.parts[0].name, "text");
                assert!(unwrapped.input.parts[0].is_element());
            }
            WrappedOutcome::NotWrapped(reason) => panic!("not wrapped: {}", reason),
        }
    }

    #[test]
    fn abstract_output_wrappers_are_rejected() {
        let document = document(
            r#"
            <xsd:element name="Echo">
              <xsd:complexType>
                <xsd:sequence/>
              </xsd:complexType>
            </xsd:element>
            <xsd:element name="EchoResponse" type="tns:AbstractResponse"/>
            <xsd:complexType name="AbstractResponse" abstract="true">
              <xsd:sequence>
                <xsd:element name="result" type="xsd:string"/>
              </xsd:sequence>
            </xsd:complexType>"#,
        );
        let schemas = schemas_for(&document);
        let operation = operation(&document, "Echo", Some("EchoResponse"));

        assert!(matches!(
            check_for_wrapped(&operation, &schemas, WrappedRules::default()),
            WrappedOutcome::NotWrapped(NotWrappedReason::AbstractType)
        ));
    }

    #[test]
    fn single_extension_level_contributes_base_children() {
        let document = document(
            r#"
            <xsd:complexType name="Base">
              <xsd:sequence>
                <xsd:element name="first" type="xsd:string"/>
              </xsd:sequence>
            </xsd:complexType>
            <xsd:element name="Echo">
              <xsd:complexType>
                <xsd:complexContent>
                  <xsd:extension base="tns:Base">
                    <xsd:sequence>
                      <xsd:element name="second" type="xsd:string"/>
                    </xsd:sequence>
                  </xsd:extension>
                </xsd:complexContent>
              </xsd:complexType>
            </xsd:element>"#,
        );
        let schemas = schemas_for(&document);
        let operation = operation(&document, "Echo", None);

        match check_for_wrapped(&operation, &schemas, WrappedRules::default()) {
            WrappedOutcome::Wrapped(unwrapped) => {
                let names: Vec<_> = unwrapped
                    .input
                    .parts
                    .iter()
                    .map(|part| part.name.as_str())
                    .collect();
                assert_eq!(names, ["first", "second"]);
            }
            WrappedOutcome::NotWrapped(reason) => panic!("not wrapped: {}", reason),
        }
    }

    #[test]
    fn typed_parts_are_never_wrapped() {
        let document = document(WRAPPED_ECHO);
        let schemas = schemas_for(&document);

        let mut operation = operation(&document, "Echo", None);
        {
            let part = &mut operation.input.as_mut().unwrap().parts[0];
            part.element = None;
            part.type_name = Some(element_named(&document, "Echo"));
        }

        assert!(matches!(
            check_for_wrapped(&operation, &schemas, WrappedRules::default()),
            WrappedOutcome::NotWrapped(NotWrappedReason::PartNotElement { side: Side::Input })
        ));
    }
}
