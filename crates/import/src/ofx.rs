//! Serializes a [`Statement`] as an OFX document.
//!
//! The document is first built as a tree of aggregates and elements, then
//! rendered either as OFX 1.02 SGML (leaf elements left open) or as OFX 2.1.1
//! XML (every element closed).

use ofxify_core::{Balance, Statement, Status, Transaction};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;
use std::io::{self, Write};

const SGML_HEADER: &str = "\
OFXHEADER:100
DATA:OFXSGML
VERSION:102
SECURITY:NONE
ENCODING:UTF-8
CHARSET:NONE
COMPRESSION:NONE
OLDFILEUID:NONE
NEWFILEUID:NONE
";

const OFX_PI: &str =
    r#"OFX OFXHEADER="200" VERSION="211" SECURITY="NONE" OLDFILEUID="NONE" NEWFILEUID="NONE""#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Markup {
    #[default]
    Sgml,
    Xml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Aggregate(&'static str, Vec<Node>),
    Element(&'static str, String),
}

fn element(tag: &'static str, value: impl Display) -> Node {
    Node::Element(tag, value.to_string())
}

fn status(status: &Status) -> Node {
    Node::Aggregate(
        "STATUS",
        vec![
            element("CODE", status.code),
            element("SEVERITY", &status.severity),
        ],
    )
}

fn balance(tag: &'static str, balance: &Balance) -> Node {
    Node::Aggregate(
        tag,
        vec![
            element("BALAMT", balance.amount),
            element("DTASOF", balance.as_of),
        ],
    )
}

fn transaction(t: &Transaction) -> Node {
    let mut children = vec![element("TRNTYPE", &t.kind)];
    children.extend(t.posted.map(|at| element("DTPOSTED", at)));
    children.extend(t.date.map(|at| element("DTUSER", at)));
    children.push(element("TRNAMT", t.amount));
    children.extend(t.id.as_deref().map(|v| element("FITID", v)));
    children.extend(t.name.as_deref().map(|v| element("NAME", v)));
    children.extend(t.payee.as_deref().map(|v| element("PAYEE", v)));
    children.extend(t.memo.as_deref().map(|v| element("MEMO", v)));
    Node::Aggregate("STMTTRN", children)
}

fn document(st: &Statement) -> Node {
    let sign_on = &st.sign_on;
    let mut sonrs = vec![
        status(&sign_on.status),
        element("DTSERVER", sign_on.generated_at),
        element("LANGUAGE", &sign_on.language),
        Node::Aggregate(
            "FI",
            vec![
                element("ORG", &sign_on.org_name),
                element("FID", &sign_on.org_id),
            ],
        ),
    ];
    sonrs.extend(sign_on.intuit_id.as_deref().map(|id| element("INTU.BID", id)));

    let account = &st.account;
    let mut tranlist = vec![
        element("DTSTART", account.start),
        element("DTEND", account.end),
    ];
    tranlist.extend(st.transactions.iter().map(transaction));

    let stmtrs = Node::Aggregate(
        "STMTRS",
        vec![
            element("CURDEF", &account.currency),
            Node::Aggregate(
                "BANKACCTFROM",
                vec![
                    element("BANKID", &account.bank_id),
                    element("ACCTID", &account.account_id),
                    element("ACCTTYPE", &account.account_type),
                ],
            ),
            Node::Aggregate("BANKTRANLIST", tranlist),
            balance("LEDGERBAL", &st.ledger_balance),
            balance("AVAILBAL", &st.available_balance),
        ],
    );

    Node::Aggregate(
        "OFX",
        vec![
            Node::Aggregate(
                "SIGNONMSGSRSV1",
                vec![Node::Aggregate("SONRS", sonrs)],
            ),
            Node::Aggregate(
                "BANKMSGSRSV1",
                vec![Node::Aggregate(
                    "STMTTRNRS",
                    vec![
                        element("TRNUID", st.transaction_uid),
                        status(&st.status),
                        stmtrs,
                    ],
                )],
            ),
        ],
    )
}

fn render_sgml<W: Write>(w: &mut W, node: &Node, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    match node {
        Node::Element(tag, value) => writeln!(w, "{indent}<{tag}>{}", partial_escape(value)),
        Node::Aggregate(tag, children) => {
            writeln!(w, "{indent}<{tag}>")?;
            for child in children {
                render_sgml(w, child, depth + 1)?;
            }
            writeln!(w, "{indent}</{tag}>")
        }
    }
}

fn render_xml<W: Write>(wr: &mut Writer<W>, node: &Node) -> io::Result<()> {
    match node {
        Node::Element(tag, value) => {
            wr.write_event(Event::Start(BytesStart::new(*tag))).map_err(xml_error)?;
            wr.write_event(Event::Text(BytesText::new(value))).map_err(xml_error)?;
            wr.write_event(Event::End(BytesEnd::new(*tag))).map_err(xml_error)?;
        }
        Node::Aggregate(tag, children) => {
            wr.write_event(Event::Start(BytesStart::new(*tag))).map_err(xml_error)?;
            for child in children {
                render_xml(wr, child)?;
            }
            wr.write_event(Event::End(BytesEnd::new(*tag))).map_err(xml_error)?;
        }
    }
    Ok(())
}

fn xml_error<E>(err: E) -> io::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    io::Error::other(err)
}

pub fn write<W: Write>(w: &mut W, st: &Statement, markup: Markup) -> io::Result<()> {
    let root = document(st);
    match markup {
        Markup::Sgml => {
            writeln!(w, "{SGML_HEADER}")?;
            render_sgml(w, &root, 0)
        }
        Markup::Xml => {
            let mut wr = Writer::new_with_indent(&mut *w, b' ', 2);
            wr.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))
                .map_err(xml_error)?;
            wr.write_event(Event::PI(BytesPI::new(OFX_PI)))
                .map_err(xml_error)?;
            render_xml(&mut wr, &root)?;
            writeln!(w)
        }
    }
}

pub fn write_sgml<W: Write>(w: &mut W, st: &Statement) -> io::Result<()> {
    write(w, st, Markup::Sgml)
}

pub fn write_xml<W: Write>(w: &mut W, st: &Statement) -> io::Result<()> {
    write(w, st, Markup::Xml)
}
