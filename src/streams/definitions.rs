//! Known streams
//!
//! Static descriptors for the object types every account has. Data
//! extensions are added at discovery time.

use super::types::{Source, StreamDescriptor};
use crate::schema::{JsonSchema, SchemaProperty};
use crate::transform::FieldRule;

fn soap(object_type: &str) -> Source {
    Source::Soap {
        object_type: object_type.to_string(),
    }
}

fn rest(endpoint: &str) -> Source {
    Source::Rest {
        endpoint: endpoint.to_string(),
    }
}

fn schema(fields: &[(&str, SchemaProperty)]) -> JsonSchema {
    fields
        .iter()
        .fold(JsonSchema::new(), |schema, (name, property)| {
            schema.with(name, property.clone())
        })
}

/// Every statically known stream, in sync order
pub fn known_streams() -> Vec<StreamDescriptor> {
    let mut streams = vec![
        campaigns(),
        content_areas(),
        emails(),
        folders(),
        lists(),
        list_sends(),
        list_subscribers(),
        sends(),
        subscribers(),
    ];
    streams.extend(events());
    streams.push(journeys());
    streams
}

fn campaigns() -> StreamDescriptor {
    use SchemaProperty as P;
    StreamDescriptor::new(
        "campaigns",
        rest("/hub/v1/campaigns"),
        schema(&[
            ("id", P::string()),
            ("name", P::string()),
            ("description", P::string()),
            ("campaignCode", P::string()),
            ("color", P::string()),
            ("favorite", P::boolean()),
            ("createdDate", P::date_time()),
            ("modifiedDate", P::date_time()),
        ]),
    )
    .with_keys(&["id"])
}

fn content_areas() -> StreamDescriptor {
    use SchemaProperty as P;
    StreamDescriptor::new(
        "content_areas",
        soap("ContentArea"),
        schema(&[
            ("ID", P::integer()),
            ("ObjectID", P::string()),
            ("CustomerKey", P::string()),
            ("Name", P::string()),
            ("CategoryID", P::integer()),
            ("Content", P::string()),
            ("Layout", P::string()),
            ("IsBlank", P::boolean()),
            ("IsDynamicContent", P::boolean()),
            ("IsLocked", P::boolean()),
            ("IsSurvey", P::boolean()),
            ("Width", P::integer()),
            ("CreatedDate", P::date_time()),
            ("ModifiedDate", P::date_time()),
        ]),
    )
    .with_keys(&["ID"])
    .incremental("ModifiedDate")
}

fn emails() -> StreamDescriptor {
    use SchemaProperty as P;
    StreamDescriptor::new(
        "emails",
        soap("Email"),
        schema(&[
            ("ID", P::integer()),
            ("ObjectID", P::string()),
            ("CustomerKey", P::string()),
            ("Name", P::string()),
            ("Subject", P::string()),
            ("PreHeader", P::string()),
            ("CategoryID", P::integer()),
            ("CharacterSet", P::string()),
            ("ContentCheckStatus", P::string()),
            ("EmailType", P::string()),
            ("Status", P::string()),
            ("HasDynamicSubjectLine", P::boolean()),
            ("IsActive", P::boolean()),
            ("IsHTMLPaste", P::boolean()),
            ("SyncTextWithHTML", P::boolean()),
            ("CreatedDate", P::date_time()),
            ("ModifiedDate", P::date_time()),
        ]),
    )
    .with_keys(&["ID"])
    .incremental("ModifiedDate")
}

fn folders() -> StreamDescriptor {
    use SchemaProperty as P;
    StreamDescriptor::new(
        "folders",
        soap("DataFolder"),
        schema(&[
            ("ID", P::integer()),
            ("ObjectID", P::string()),
            ("CustomerKey", P::string()),
            ("Name", P::string()),
            ("Description", P::string()),
            ("ContentType", P::string()),
            ("ParentFolder", P::integer()),
            ("AllowChildren", P::boolean()),
            ("IsActive", P::boolean()),
            ("IsEditable", P::boolean()),
            ("CreatedDate", P::date_time()),
            ("ModifiedDate", P::date_time()),
        ]),
    )
    .with_keys(&["ID"])
    .incremental("ModifiedDate")
    .with_rule(FieldRule::lift("ParentFolder", "ParentFolder.ID"))
}

fn lists() -> StreamDescriptor {
    use SchemaProperty as P;
    StreamDescriptor::new(
        "lists",
        soap("List"),
        schema(&[
            ("ID", P::integer()),
            ("ObjectID", P::string()),
            ("CustomerKey", P::string()),
            ("ListName", P::string()),
            ("Description", P::string()),
            ("Category", P::integer()),
            ("Type", P::string()),
            ("ListClassification", P::string()),
            ("CreatedDate", P::date_time()),
            ("ModifiedDate", P::date_time()),
        ]),
    )
    .with_keys(&["ID"])
    .incremental("ModifiedDate")
}

fn list_sends() -> StreamDescriptor {
    use SchemaProperty as P;
    StreamDescriptor::new(
        "list_sends",
        soap("ListSend"),
        schema(&[
            ("ListID", P::integer()),
            ("SendID", P::integer()),
            ("NumberSent", P::integer()),
            ("NumberDelivered", P::integer()),
            ("UniqueOpens", P::integer()),
            ("UniqueClicks", P::integer()),
            ("HardBounces", P::integer()),
            ("SoftBounces", P::integer()),
            ("OtherBounces", P::integer()),
            ("Unsubscribes", P::integer()),
            ("MissingAddresses", P::integer()),
            ("ExistingUndeliverables", P::integer()),
            ("ForwardedEmails", P::integer()),
            ("CreatedDate", P::date_time()),
            ("ModifiedDate", P::date_time()),
        ]),
    )
    .with_keys(&["ListID", "SendID"])
    .with_rule(FieldRule::lift("ListID", "List.ID"))
}

fn list_subscribers() -> StreamDescriptor {
    use SchemaProperty as P;
    StreamDescriptor::new(
        "list_subscribers",
        soap("ListSubscriber"),
        schema(&[
            ("ID", P::integer()),
            ("ObjectID", P::string()),
            ("ListID", P::integer()),
            ("SubscriberKey", P::string()),
            ("Status", P::string()),
            ("UnsubscribedDate", P::date_time()),
            ("CreatedDate", P::date_time()),
            ("ModifiedDate", P::date_time()),
        ]),
    )
    .with_keys(&["SubscriberKey", "ListID"])
    .incremental("ModifiedDate")
}

fn sends() -> StreamDescriptor {
    use SchemaProperty as P;
    StreamDescriptor::new(
        "sends",
        soap("Send"),
        schema(&[
            ("ID", P::integer()),
            ("EmailID", P::integer()),
            ("EmailName", P::string()),
            ("Subject", P::string()),
            ("FromName", P::string()),
            ("FromAddress", P::string()),
            ("Status", P::string()),
            ("IsAlwaysOn", P::boolean()),
            ("IsMultipart", P::boolean()),
            ("NumberTargeted", P::integer()),
            ("NumberSent", P::integer()),
            ("NumberDelivered", P::integer()),
            ("NumberErrored", P::integer()),
            ("UniqueOpens", P::integer()),
            ("UniqueClicks", P::integer()),
            ("HardBounces", P::integer()),
            ("SoftBounces", P::integer()),
            ("OtherBounces", P::integer()),
            ("Unsubscribes", P::integer()),
            ("MissingAddresses", P::integer()),
            ("SendDate", P::date_time()),
            ("SentDate", P::date_time()),
            ("CreatedDate", P::date_time()),
            ("ModifiedDate", P::date_time()),
        ]),
    )
    .with_keys(&["ID"])
    .incremental("ModifiedDate")
    .with_rule(FieldRule::lift("EmailID", "Email.ID"))
}

fn subscribers() -> StreamDescriptor {
    use SchemaProperty as P;
    StreamDescriptor::new(
        "subscribers",
        soap("Subscriber"),
        schema(&[
            ("ID", P::integer()),
            ("SubscriberKey", P::string()),
            ("EmailAddress", P::string()),
            ("EmailTypePreference", P::string()),
            ("Status", P::string()),
            ("PartnerKey", P::string()),
            ("UnsubscribedDate", P::date_time()),
            ("CreatedDate", P::date_time()),
            ("ModifiedDate", P::date_time()),
        ]),
    )
    .with_keys(&["ID"])
    .incremental("ModifiedDate")
}

fn event(name: &str, object_type: &str, extra: &[(&str, SchemaProperty)]) -> StreamDescriptor {
    use SchemaProperty as P;
    let mut fields = vec![
        ("SendID", P::integer()),
        ("SubscriberKey", P::string()),
        ("EventDate", P::date_time()),
        ("EventType", P::string()),
        ("BatchID", P::integer()),
        ("TriggeredSendDefinitionObjectID", P::string()),
    ];
    fields.extend(extra.iter().cloned());
    StreamDescriptor::new(name, soap(object_type), schema(&fields))
        .with_keys(&["SendID", "EventType", "SubscriberKey", "EventDate"])
        .incremental("EventDate")
}

fn events() -> Vec<StreamDescriptor> {
    use SchemaProperty as P;
    vec![
        event("sent_events", "SentEvent", &[]),
        event("open_events", "OpenEvent", &[]),
        event(
            "click_events",
            "ClickEvent",
            &[("URL", P::string()), ("URLID", P::integer())],
        ),
        event(
            "bounce_events",
            "BounceEvent",
            &[
                ("BounceCategory", P::string()),
                ("BounceType", P::string()),
                ("SMTPCode", P::string()),
                ("SMTPReason", P::string()),
            ],
        ),
        event(
            "unsub_events",
            "UnsubEvent",
            &[("IsMasterUnsubscribed", P::boolean())],
        ),
    ]
}

fn journeys() -> StreamDescriptor {
    use SchemaProperty as P;
    StreamDescriptor::new(
        "journeys",
        rest("/interaction/v1/interactions"),
        schema(&[
            ("id", P::string()),
            ("key", P::string()),
            ("name", P::string()),
            ("description", P::string()),
            ("version", P::integer()),
            ("status", P::string()),
            ("entryMode", P::string()),
            ("definitionType", P::string()),
            ("createdDate", P::date_time()),
            ("modifiedDate", P::date_time()),
            ("lastPublishedDate", P::date_time()),
        ]),
    )
    .with_keys(&["id"])
}
