mod common;

use common::{client, url};
use pretty_assertions::assert_eq;
use rally_rest::{AttributeValue, Attributes, CollectionPolicy, RallyError, Resource};
use rally_transport::{Method, TransportError};
use std::collections::HashSet;

fn text(value: &str) -> Option<AttributeValue> {
    Some(AttributeValue::from(value))
}

// ── Identity ────────────────────────────────────────────────────

#[test]
fn type_from_reference_stub_attribute() {
    let (client, _) = client(CollectionPolicy::Flat);
    let r = client
        .from_xml(r#"<Object refObjectName="name" ref="ref" type="Defect"/>"#)
        .unwrap();
    assert_eq!(r.resource_type().as_deref(), Some("Defect"));
    assert!(!r.is_materialized());
}

#[test]
fn type_from_full_object_tag() {
    let (client, _) = client(CollectionPolicy::Flat);
    let r = client
        .from_xml(r#"<Defect refObjectName="name" ref="ref"><Name>name</Name></Defect>"#)
        .unwrap();
    assert_eq!(r.resource_type().as_deref(), Some("Defect"));
    assert_eq!(r.ref_url().as_deref(), Some("ref"));
    assert_eq!(r.name().as_deref(), Some("name"));
    assert!(r.is_materialized());
}

#[test]
fn oid_and_type_symbol() {
    let (client, _) = client(CollectionPolicy::Flat);
    let r = client
        .from_xml(
            r#"<HierarchicalRequirement ref="ref"><Name>n</Name><ObjectID>12345</ObjectID></HierarchicalRequirement>"#,
        )
        .unwrap();
    assert_eq!(r.oid().unwrap().as_deref(), Some("12345"));
    assert_eq!(r.type_symbol().as_deref(), Some("hierarchical_requirement"));
}

#[test]
fn element_names_are_underscored() {
    let (client, _) = client(CollectionPolicy::Flat);
    let r = client
        .from_xml(
            r#"<Object ref="bla">
                 <TextNode>text</TextNode>
                 <SalesforceCaseID>12345</SalesforceCaseID>
               </Object>"#,
        )
        .unwrap();
    assert_eq!(r.get("text_node").unwrap(), text("text"));
    assert_eq!(r.get("salesforce_case_i_d").unwrap(), text("12345"));
    assert_eq!(r.get("TextNode").unwrap(), None);
    assert_eq!(r.get("textnode").unwrap(), None);
}

#[test]
fn nested_text_nodes_become_maps() {
    let (client, _) = client(CollectionPolicy::Flat);
    let r = client
        .from_xml(
            r#"<Object ref="bla">
                 <Nested><TextNode>text</TextNode></Nested>
               </Object>"#,
        )
        .unwrap();
    let nested = r.get("nested").unwrap().unwrap();
    assert_eq!(nested.get("text_node"), Some(&AttributeValue::from("text")));
}

#[test]
fn empty_element_is_null_and_missing_element_is_absent() {
    let (client, _) = client(CollectionPolicy::Flat);
    let r = client
        .from_xml(r#"<Defect ref="ref"><Notes/></Defect>"#)
        .unwrap();
    assert_eq!(r.get("notes").unwrap(), Some(AttributeValue::Null));
    assert_eq!(r.get("description").unwrap(), None);
}

#[test]
fn equality_hash_and_order_follow_ref() {
    let (client, _) = client(CollectionPolicy::Flat);
    let a1 = client.reference(&url("defect/1"));
    let a2 = client.reference(&url("defect/1"));
    let b = client.reference(&url("defect/2"));

    assert_eq!(a1, a2);
    assert_ne!(a1, b);
    assert!(a1 < b);

    let set: HashSet<Resource> = [a1.clone(), a2, b].into_iter().collect();
    assert_eq!(set.len(), 2);

    let unsaved = Resource::new();
    assert_eq!(unsaved, unsaved.clone());
    assert_ne!(unsaved, Resource::new());
    assert!(unsaved < a1);
}

// ── Lazy reads ──────────────────────────────────────────────────

#[test]
fn reference_is_read_on_first_access() {
    let (client, mock) = client(CollectionPolicy::Flat);
    mock.on_get(
        url("testcase/1"),
        "<TestCase><Name>name1</Name><Description>Description</Description></TestCase>",
    );

    let r = client
        .from_xml(&format!(r#"<TestCase ref="{}" refObjectName="name1"/>"#, url("testcase/1")))
        .unwrap();
    assert_eq!(mock.request_count(), 0);
    assert_eq!(r.get("description").unwrap(), text("Description"));
    assert!(r.is_materialized());
    // The stub's identity survives a document without one.
    assert_eq!(r.ref_url(), Some(url("testcase/1")));
    assert_eq!(r.name().as_deref(), Some("name1"));
}

#[test]
fn nested_reference_is_read_only_once() {
    let (client, mock) = client(CollectionPolicy::Flat);
    mock.on_get(
        url("testcase/1"),
        "<TestCase><Name>name1</Name><Description>Description</Description></TestCase>",
    );

    let defect = client
        .from_xml(&format!(
            r#"<Defect ref="{}"><TestCase ref="{}" refObjectName="name1"/></Defect>"#,
            url("defect/1"),
            url("testcase/1")
        ))
        .unwrap();

    let test_case = defect.get("test_case").unwrap().unwrap();
    let test_case = test_case.as_resource().unwrap();
    assert_eq!(test_case.resource_type().as_deref(), Some("TestCase"));
    assert_eq!(test_case.get("description").unwrap(), text("Description"));
    assert_eq!(test_case.get("description").unwrap(), text("Description"));

    assert_eq!(mock.count(Method::Get, &url("testcase/1")), 1);
}

#[test]
fn embedded_objects_are_not_read_again() {
    let (client, mock) = client(CollectionPolicy::Flat);
    mock.on_get(
        url("iteration/9"),
        "<Iteration><Name>name1</Name><StartDate>12/12/01</StartDate></Iteration>",
    );

    let r = client
        .from_xml(&format!(
            r#"<QueryResult>
                 <Results>
                   <Card ref="{c1}" refObjectName="Card1">
                     <Name>Card1</Name>
                     <Description>Description1</Description>
                     <Iteration ref="{it}" refObjectName="name1"/>
                   </Card>
                   <Card ref="{c2}" refObjectName="Card2">
                     <Name>Card2</Name>
                     <Description>Description2</Description>
                     <Iteration ref="{it}" refObjectName="name1"/>
                   </Card>
                 </Results>
               </QueryResult>"#,
            c1 = url("card/1"),
            c2 = url("card/2"),
            it = url("iteration/9"),
        ))
        .unwrap();

    let results = r.get("results").unwrap().unwrap();
    let results = results.as_list().unwrap();
    assert_eq!(results.len(), 2);

    let first = results[0].as_resource().unwrap();
    assert!(first.is_materialized());
    assert_eq!(first.get("description").unwrap(), text("Description1"));

    let iteration = first.get("iteration").unwrap().unwrap();
    let iteration = iteration.as_resource().unwrap();
    assert_eq!(iteration.get("start_date").unwrap(), text("12/12/01"));
    assert_eq!(iteration.get("start_date").unwrap(), text("12/12/01"));
    assert_eq!(mock.request_count(), 1);
}

#[test]
fn reading_a_stub_without_client_fails() {
    let r = Resource::from_xml(None, r#"<Defect ref="https://h/defect/1"/>"#).unwrap();
    assert!(matches!(r.get("name"), Err(RallyError::InvalidState(_))));
}

#[test]
fn refresh_rereads_and_keeps_pending_edits() {
    let (client, mock) = client(CollectionPolicy::Flat);
    let ref_url = url("defect/1");
    mock.enqueue(
        Method::Get,
        ref_url.clone(),
        Ok(format!(r#"<Defect ref="{ref_url}"><State>Open</State></Defect>"#)),
    )
    .on_get(
        ref_url.clone(),
        format!(r#"<Defect ref="{ref_url}"><State>Fixed</State></Defect>"#),
    );

    let r = client.reference(&ref_url);
    assert_eq!(r.get("state").unwrap(), text("Open"));
    r.set("notes", "local");
    r.refresh().unwrap();
    assert_eq!(r.get("state").unwrap(), text("Fixed"));
    assert_eq!(r.get("notes").unwrap(), text("local"));
    assert_eq!(mock.count(Method::Get, &ref_url), 2);
}

// ── Collections ─────────────────────────────────────────────────

fn story_with_tasks(names: [Option<&str>; 3]) -> String {
    let tasks: String = names
        .iter()
        .enumerate()
        .map(|(i, name)| match name {
            Some(name) => format!(r#"<Task refObjectName="{name}" ref="{}"/>"#, url(&format!("task/{i}"))),
            None => format!(r#"<Task ref="{}"/>"#, url(&format!("task/{i}"))),
        })
        .collect();
    format!(r#"<Story refObjectName="story" ref="http"><Tasks>{tasks}</Tasks></Story>"#)
}

#[test]
fn collections_parse_as_lists_under_flat_policy() {
    let (client, _) = client(CollectionPolicy::Flat);
    let story = client
        .from_xml(&story_with_tasks([Some("t1"), Some("t2"), Some("t2")]))
        .unwrap();
    let tasks = story.get("tasks").unwrap().unwrap();
    assert_eq!(tasks.as_list().unwrap().len(), 3);
}

#[test]
fn collections_parse_as_maps_under_named_policy() {
    let (client, _) = client(CollectionPolicy::Named);
    let story = client
        .from_xml(&story_with_tasks([Some("task1"), Some("task2"), Some("task3")]))
        .unwrap();
    let tasks = story.get("tasks").unwrap().unwrap();
    assert_eq!(tasks.as_map().unwrap().len(), 3);
}

#[test]
fn duplicate_display_names_stack_into_lists() {
    let (client, _) = client(CollectionPolicy::Named);
    let story = client
        .from_xml(&story_with_tasks([Some("t1"), Some("t2"), Some("t2")]))
        .unwrap();
    let tasks = story.get("tasks").unwrap().unwrap();
    let tasks = tasks.as_map().unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.get("t1").unwrap().as_resource().is_some());
    assert_eq!(tasks.get("t2").unwrap().as_list().unwrap().len(), 2);
}

#[test]
fn unnamed_collections_stay_lists_under_named_policy() {
    let (client, _) = client(CollectionPolicy::Named);
    let story = client.from_xml(&story_with_tasks([None, None, None])).unwrap();
    let tasks = story.get("tasks").unwrap().unwrap();
    assert_eq!(tasks.as_list().unwrap().len(), 3);
}

#[test]
fn each_collection_member_is_read_lazily() {
    let (client, mock) = client(CollectionPolicy::Flat);
    mock.on_get(
        format!("{}*", url("task/")),
        "<Task><Name>name1</Name><Description>Description</Description></Task>",
    );
    let story = client
        .from_xml(&story_with_tasks([Some("task1"), Some("task2"), Some("task3")]))
        .unwrap();
    let tasks = story.get("tasks").unwrap().unwrap();
    let tasks = tasks.as_list().unwrap();

    let first = tasks[0].as_resource().unwrap();
    let last = tasks[2].as_resource().unwrap();
    assert_eq!(first.get("description").unwrap(), text("Description"));
    assert_eq!(first.get("description").unwrap(), text("Description"));
    assert_eq!(last.get("description").unwrap(), text("Description"));
    assert_eq!(mock.request_count(), 2);
}

#[test]
fn repeated_scalar_elements_become_lists() {
    let (client, _) = client(CollectionPolicy::Flat);
    let r = client
        .from_xml(r#"<Object ref="r"><Tag>a</Tag><Tag>b</Tag><Tag>c</Tag></Object>"#)
        .unwrap();
    assert_eq!(
        r.get("tag").unwrap(),
        Some(AttributeValue::from(vec!["a", "b", "c"]))
    );
}

// ── Edits ───────────────────────────────────────────────────────

#[test]
fn pending_edits_win_over_parsed_values() {
    let (client, _) = client(CollectionPolicy::Flat);
    let r = client
        .from_xml(r#"<Defect ref="ref" refObjectName="old"><Name>old</Name></Defect>"#)
        .unwrap();
    r.set("name", "new");
    r.set("description", "description");
    assert_eq!(r.get("name").unwrap(), text("new"));
    assert_eq!(r.name().as_deref(), Some("new"));
    assert_eq!(r.get("description").unwrap(), text("description"));
    assert_eq!(r.pending().len(), 2);
}

#[test]
fn save_posts_pending_edits_and_adopts_the_response() {
    let (client, mock) = client(CollectionPolicy::Flat);
    mock.on_post(
        url("Defect/create"),
        format!(
            r#"<CreateResult><Errors/><Object ref="{}" refObjectName="name">
                 <Name>name</Name><Description>server copy</Description>
               </Object></CreateResult>"#,
            url("defect/5")
        ),
    );

    let r = client.new_resource("defect");
    r.set("name", "name");
    r.set("description", "local copy");
    r.save().unwrap();

    let sent = mock.last(Method::Post).unwrap();
    assert_eq!(
        sent.body.as_deref(),
        Some(
            r#"<?xml version="1.0" encoding="UTF-8"?><Defect><Description>local copy</Description><Name>name</Name></Defect>"#
        )
    );
    assert_eq!(r.ref_url(), Some(url("defect/5")));
    assert_eq!(r.name().as_deref(), Some("name"));
    assert_eq!(r.get("description").unwrap(), text("server copy"));
    assert!(r.pending().is_empty());
}

#[test]
fn save_requires_client_and_type() {
    let r = Resource::new();
    r.set_type("defect");
    let err = r.save().unwrap_err();
    assert!(matches!(&err, RallyError::InvalidState(m) if m.contains("missing client")));

    let (client, _) = client(CollectionPolicy::Flat);
    let r = Resource::new();
    r.set_client(&client);
    let err = r.save().unwrap_err();
    assert!(matches!(&err, RallyError::InvalidState(m) if m.contains("missing object type")));
}

#[test]
fn update_posts_to_ref_and_rereads() {
    let (client, mock) = client(CollectionPolicy::Flat);
    let ref_url = url("defect/1");
    mock.enqueue(
        Method::Get,
        ref_url.clone(),
        Ok(format!(r#"<Defect ref="{ref_url}"><State>Open</State></Defect>"#)),
    )
    .on_get(
        ref_url.clone(),
        format!(r#"<Defect ref="{ref_url}"><State>Closed</State></Defect>"#),
    )
    .on_post(ref_url.clone(), "<OperationResult><Errors/></OperationResult>");

    let r = client.reference(&ref_url);
    assert_eq!(r.get("state").unwrap(), text("Open"));
    r.set("notes", "done");

    let changes: Attributes = [("state", "Closed")].into_iter().collect();
    r.update(changes).unwrap();

    let sent = mock.last(Method::Post).unwrap();
    assert_eq!(sent.url, ref_url);
    assert_eq!(
        sent.body.unwrap(),
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Defect ref="{ref_url}"><Notes>done</Notes><State>Closed</State></Defect>"#
        )
    );
    assert_eq!(r.get("state").unwrap(), text("Closed"));
    assert!(r.pending().is_empty());
}

#[test]
fn delete_targets_the_ref() {
    let (client, mock) = client(CollectionPolicy::Flat);
    let ref_url = url("defect/1");
    mock.on_delete(ref_url.clone(), "<OperationResult><Errors/></OperationResult>");

    let r = client.reference(&ref_url);
    client.delete(&r).unwrap();
    assert_eq!(mock.count(Method::Delete, &ref_url), 1);
}

#[test]
fn unsaved_resource_cannot_be_updated_or_deleted() {
    let (client, _) = client(CollectionPolicy::Flat);
    let r = client.new_resource("defect");
    assert!(matches!(r.delete(), Err(RallyError::InvalidState(_))));
    assert!(matches!(r.update(Attributes::new()), Err(RallyError::InvalidState(_))));
}

#[test]
fn duplicate_shares_no_state() {
    let (client, _) = client(CollectionPolicy::Flat);
    let r = client
        .from_xml(r#"<Defect ref="ref"><Name>n</Name></Defect>"#)
        .unwrap();
    let copy = r.duplicate();
    copy.set("name", "changed");

    assert_eq!(copy, r);
    assert!(!copy.ptr_eq(&r));
    assert_eq!(r.get("name").unwrap(), text("n"));
    assert_eq!(copy.get("name").unwrap(), text("changed"));
}

#[test]
fn body_returns_the_backing_document() {
    let r = Resource::from_xml(None, r#"<Defect ref="ref"><Name>a &amp; b</Name></Defect>"#).unwrap();
    assert_eq!(
        r.body().unwrap().as_deref(),
        Some(r#"<Defect ref="ref"><Name>a &amp; b</Name></Defect>"#)
    );
    assert_eq!(Resource::new().body().unwrap(), None);
}

// ── Errors ──────────────────────────────────────────────────────

#[test]
fn error_payload_surfaces_as_remote_error() {
    let (client, mock) = client(CollectionPolicy::Flat);
    let errors = "<Errors><OperationResultError>Not found</OperationResultError></Errors>";
    mock.respond_with(Method::Get, url("defect/1"), Err(TransportError::Remote(errors.into())));

    let err = client.reference(&url("defect/1")).get("name").unwrap_err();
    assert!(matches!(err, RallyError::Remote(raw) if raw == errors));
}

#[test]
fn unauthorized_surfaces_as_authentication_error() {
    let (client, mock) = client(CollectionPolicy::Flat);
    mock.respond_with(Method::Get, url("user"), Err(TransportError::Unauthorized));

    let err = client.user().unwrap_err();
    assert!(
        matches!(&err, RallyError::Authentication(m) if m == "Invalid Username or Password."),
        "got {err:?}"
    );
}

#[test]
fn typedef_is_skipped_for_untyped_resources() {
    let (client, _) = client(CollectionPolicy::Flat);
    for tag in ["User", "Workspace", "Subscription"] {
        let r = client
            .from_xml(&format!(r#"<{tag} ref="r"><Name>n</Name></{tag}>"#))
            .unwrap();
        assert_eq!(r.typedef().unwrap(), None);
    }
}
