//! PubMed efetch XML parser using quick-xml
//!
//! Streaming parser for the `PubmedArticleSet` payload returned by
//! `efetch.fcgi?db=pubmed&retmode=xml`. Only the fields the article
//! artifact carries are extracted.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parsed PubMed article
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PubmedArticle {
    // Identifiers
    pub pmid: String,
    pub doi: Option<String>,
    pub elocation_doi: Option<String>,

    // Article
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub language: Option<String>,
    pub publication_types: Vec<String>,

    // Journal
    pub journal_title: Option<String>,
    pub pub_year: Option<i32>,
    pub pub_month: Option<i32>,
    pub pub_day: Option<i32>,

    pub authors: Vec<Author>,
    pub mesh_descriptors: Vec<String>,
    pub grant_ids: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Author {
    pub last_name: Option<String>,
    pub fore_name: Option<String>,
}

/// Parse every `PubmedArticle` in an efetch payload.
///
/// An article that fails to parse is logged and skipped; a payload that is
/// not well-formed XML at the top level is an error.
pub fn parse_pubmed_xml(xml: &str) -> Result<Vec<PubmedArticle>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"PubmedArticle" => {
                match parse_article(&mut reader) {
                    Ok(article) => articles.push(article),
                    Err(e) => log::warn!("Skipping unparseable PubmedArticle: {e:#}"),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("XML parse error"),
            _ => {}
        }
        buf.clear();
    }

    Ok(articles)
}

fn parse_article(reader: &mut Reader<&[u8]>) -> Result<PubmedArticle> {
    let mut article = PubmedArticle::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"MedlineCitation" => parse_medline_citation(reader, &mut article)?,
                b"PubmedData" => parse_pubmed_data(reader, &mut article)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedArticle" => break,
            Event::Eof => anyhow::bail!("unexpected end of input inside PubmedArticle"),
            _ => {}
        }
        buf.clear();
    }

    Ok(article)
}

fn parse_medline_citation(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"PMID" => article.pmid = read_text(reader)?.trim().to_string(),
                b"Article" => parse_article_element(reader, article)?,
                b"MeshHeadingList" => article.mesh_descriptors = parse_mesh_list(reader)?,
                // Comment/correction lists carry their own PMIDs
                b"CommentsCorrectionsList" => skip_element(reader, b"CommentsCorrectionsList")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"MedlineCitation" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_element(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Journal" => parse_journal(reader, article)?,
                b"ArticleTitle" => {
                    article.title = Some(read_text_content(reader, b"ArticleTitle")?)
                }
                b"Abstract" => article.abstract_text = Some(parse_abstract(reader)?),
                b"AuthorList" => article.authors = parse_author_list(reader)?,
                b"Language" => {
                    let language = read_text(reader)?;
                    if article.language.is_none() {
                        article.language = Some(language);
                    }
                }
                b"GrantList" => article.grant_ids = parse_grant_list(reader)?,
                b"PublicationTypeList" => article.publication_types = parse_pub_type_list(reader)?,
                b"ELocationID" => {
                    let is_doi = attribute(&e, b"EIdType").is_some_and(|t| t == "doi");
                    let value = read_text(reader)?;
                    if is_doi && article.elocation_doi.is_none() {
                        article.elocation_doi = Some(value);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Article" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_journal(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Title" => article.journal_title = Some(read_text(reader)?),
                b"PubDate" => parse_pub_date(reader, article)?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Journal" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_pub_date(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"Year" => article.pub_year = read_text(reader)?.trim().parse().ok(),
                b"Month" => article.pub_month = parse_month(read_text(reader)?.trim()),
                b"Day" => article.pub_day = read_text(reader)?.trim().parse().ok(),
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubDate" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Month as 1..=12 from either a number or an English abbreviation
fn parse_month(s: &str) -> Option<i32> {
    match s.parse::<i32>() {
        Ok(n) if (1..=12).contains(&n) => Some(n),
        Ok(_) => None,
        Err(_) => match s.to_lowercase().get(..3)? {
            "jan" => Some(1),
            "feb" => Some(2),
            "mar" => Some(3),
            "apr" => Some(4),
            "may" => Some(5),
            "jun" => Some(6),
            "jul" => Some(7),
            "aug" => Some(8),
            "sep" => Some(9),
            "oct" => Some(10),
            "nov" => Some(11),
            "dec" => Some(12),
            _ => None,
        },
    }
}

fn parse_abstract(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text_parts = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"AbstractText" => {
                text_parts.push(read_text_content(reader, b"AbstractText")?);
            }
            Event::End(e) if e.name().as_ref() == b"Abstract" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text_parts.join(" "))
}

fn parse_author_list(reader: &mut Reader<&[u8]>) -> Result<Vec<Author>> {
    let mut authors = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"Author" => {
                authors.push(parse_author(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"AuthorList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(authors)
}

fn parse_author(reader: &mut Reader<&[u8]>) -> Result<Author> {
    let mut author = Author::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"LastName" => author.last_name = Some(read_text(reader)?),
                b"ForeName" => author.fore_name = Some(read_text(reader)?),
                b"AffiliationInfo" => skip_element(reader, b"AffiliationInfo")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"Author" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(author)
}

fn parse_mesh_list(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let mut descriptors = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"DescriptorName" => {
                descriptors.push(read_text(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"MeshHeadingList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(descriptors)
}

fn parse_grant_list(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let mut grant_ids = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"GrantID" => {
                let id = read_text(reader)?;
                if !id.trim().is_empty() {
                    grant_ids.push(id);
                }
            }
            Event::End(e) if e.name().as_ref() == b"GrantList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(grant_ids)
}

fn parse_pub_type_list(reader: &mut Reader<&[u8]>) -> Result<Vec<String>> {
    let mut types = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"PublicationType" => {
                types.push(read_text(reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"PublicationTypeList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(types)
}

fn parse_pubmed_data(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"ArticleIdList" => parse_article_id_list(reader, article)?,
                // References carry ArticleIdLists of the cited works
                b"ReferenceList" => skip_element(reader, b"ReferenceList")?,
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"PubmedData" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_id_list(reader: &mut Reader<&[u8]>, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"ArticleId" => {
                let is_doi = attribute(&e, b"IdType").is_some_and(|t| t == "doi");
                let value = read_text(reader)?;
                if is_doi && article.doi.is_none() {
                    article.doi = Some(value);
                }
            }
            Event::End(e) if e.name().as_ref() == b"ArticleIdList" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Value of an attribute on a start tag
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

fn skip_element(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Read text content until next end tag
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::End(_) => break,
            Event::Start(_) => {
                // Handle nested elements (like <i>, <b>, etc.)
                text.push_str(&read_text(reader)?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

/// Read text content of a specific element, flattening nested markup.
///
/// Whitespace is kept while reading so `CO<sub>2</sub>` stays `CO2` and
/// `<i>E. coli</i> growth` keeps its space; runs are then collapsed.
fn read_text_content(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<String> {
    reader.config_mut().trim_text(false);
    let raw = read_raw_content(reader, end_tag);
    reader.config_mut().trim_text(true);

    Ok(raw?.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn read_raw_content(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth -= 1;
                if depth == 0 && e.name().as_ref() == end_tag {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
