use crate::language::ast::{File, Node, OptionValue};

/// Locate the ordered ancestor chain of syntax nodes enclosing `offset`,
/// root (file) first. Containment uses intersection semantics: an offset at
/// a boundary shared by two siblings belongs to the earlier-ending one, so
/// a cursor just past a construct's last token still counts as inside it.
///
/// Returns `None` when nothing below the file node contains the offset.
/// Pure function of its inputs.
pub fn narrowest_enclosing_scope(file: &File, offset: usize) -> Option<Vec<Node<'_>>> {
    let mut path = vec![Node::File(file)];
    loop {
        let mut children = child_nodes(*path.last().expect("path is never empty"));
        children.sort_by_key(|node| (node.span().start, node.span().end));
        match children
            .into_iter()
            .find(|node| node.span().intersects(offset))
        {
            Some(child) => path.push(child),
            None => break,
        }
    }
    if path.len() > 1 {
        Some(path)
    } else {
        None
    }
}

fn child_nodes<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut children = Vec::new();
    match node {
        Node::File(file) => {
            children.extend(file.messages.iter().map(Node::Message));
            children.extend(file.enums.iter().map(Node::Enum));
            children.extend(file.extends.iter().map(Node::Extend));
            children.extend(file.options.iter().map(Node::Option));
        }
        Node::Message(message) => {
            children.extend(message.fields.iter().map(Node::Field));
            children.extend(message.options.iter().map(Node::Option));
            children.extend(message.nested.iter().map(Node::Message));
            children.extend(message.enums.iter().map(Node::Enum));
            children.extend(message.extends.iter().map(Node::Extend));
        }
        Node::Field(field) => {
            children.extend(field.options.iter().map(Node::Option));
        }
        Node::Extend(extend) => {
            children.extend(extend.fields.iter().map(Node::Field));
        }
        Node::Enum(_) => {}
        Node::Option(option) => push_value_nodes(&option.value, &mut children),
        Node::MessageLiteral(literal) => {
            children.extend(literal.elements.iter().map(Node::LiteralElement));
        }
        Node::LiteralElement(element) => {
            if let Some(value) = &element.value {
                push_value_nodes(value, &mut children);
            }
        }
    }
    children
}

fn push_value_nodes<'a>(value: &'a OptionValue, children: &mut Vec<Node<'a>>) {
    match value {
        OptionValue::Message(literal) => children.push(Node::MessageLiteral(literal)),
        OptionValue::List(values, _) => {
            for value in values {
                push_value_nodes(value, children);
            }
        }
        _ => {}
    }
}
