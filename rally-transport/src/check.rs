//! Response classification.

use crate::error::{TransportError, TransportResult};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Classifies a response before its body is handed to the caller.
///
/// - 401 fails with [`TransportError::Unauthorized`]
/// - a body whose first `<Errors>` element has child elements fails with
///   [`TransportError::Remote`] carrying that element verbatim
/// - any other non-2xx status fails with [`TransportError::Status`]
///
/// Bodies that are not XML are passed through untouched.
pub fn check_response(status: u16, body: &str) -> TransportResult<()> {
    if status == 401 {
        return Err(TransportError::Unauthorized);
    }
    if let Some(errors) = error_payload(body) {
        return Err(TransportError::Remote(errors));
    }
    if !(200..300).contains(&status) {
        return Err(TransportError::Status {
            status,
            body: body.to_string(),
        });
    }
    Ok(())
}

/// Returns the raw text of the first `<Errors>` element in `body` if it has
/// at least one child element. An empty `<Errors/>` means success.
pub fn error_payload(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    let mut depth = 0usize;
    // (byte offset of `<Errors`, depth of the element, saw a child element)
    let mut errors: Option<(usize, usize, bool)> = None;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if let Some((_, at, children)) = errors.as_mut() {
                    if depth == *at + 1 {
                        *children = true;
                    }
                } else if e.name().as_ref() == b"Errors" {
                    errors = Some((before, depth, false));
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some((_, at, children)) = errors.as_mut() {
                    if depth == *at {
                        *children = true;
                    }
                } else if e.name().as_ref() == b"Errors" {
                    return None;
                }
            }
            Ok(Event::End(_)) => {
                if let Some((start, at, children)) = errors {
                    if depth == at {
                        if !children {
                            return None;
                        }
                        let end = reader.buffer_position() as usize;
                        return body.get(start..end).map(str::to_string);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_with_children_are_returned_verbatim() {
        let body = "<CreateResult><Errors><OperationResultError>Not authorized</OperationResultError></Errors></CreateResult>";
        assert_eq!(
            error_payload(body).as_deref(),
            Some("<Errors><OperationResultError>Not authorized</OperationResultError></Errors>")
        );
    }

    #[test]
    fn empty_errors_are_success() {
        assert_eq!(error_payload("<OperationResult><Errors/></OperationResult>"), None);
        assert_eq!(
            error_payload("<OperationResult><Errors></Errors><Warnings/></OperationResult>"),
            None
        );
    }

    #[test]
    fn non_xml_body_is_ignored() {
        assert_eq!(error_payload("Service unavailable"), None);
        assert_eq!(error_payload(""), None);
    }
}
