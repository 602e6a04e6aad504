use crate::error::RagError;
use crate::models::{Chunk, Page, RagOptions};
use sha2::{Digest, Sha256};

/// Coarsest to finest. Separators stay attached to the end of the piece they
/// terminate, so pieces tile the page text with no gaps.
pub const DEFAULT_SEPARATORS: [&str; 7] = ["\n\n", "\n", ". ", "! ", "? ", " ", ""];

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagError> {
        let config = Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Configuration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Configuration(format!(
                "chunk_overlap {} must be smaller than chunk_size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separators.is_empty() {
            return Err(RagError::Configuration(
                "separator list must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<&RagOptions> for ChunkingConfig {
    type Error = RagError;

    fn try_from(value: &RagOptions) -> Result<Self, Self::Error> {
        let config = Self {
            chunk_size: value.chunk_size,
            chunk_overlap: value.chunk_overlap,
            separators: value.separators.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

pub fn split(
    pages: &[Page],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>, RagError> {
    let config = ChunkingConfig::new(chunk_size, chunk_overlap)?;
    split_pages(pages, &config)
}

pub fn split_pages(pages: &[Page], config: &ChunkingConfig) -> Result<Vec<Chunk>, RagError> {
    config.validate()?;

    let mut chunks = Vec::new();
    for page in pages {
        chunks.extend(split_page(page, config));
    }
    Ok(chunks)
}

pub fn split_page(page: &Page, config: &ChunkingConfig) -> Vec<Chunk> {
    let text = page.text.as_str();
    if text.trim().is_empty() {
        return Vec::new();
    }

    let whole = Span {
        start: 0,
        end: text.len(),
        chars: text.chars().count(),
    };
    let mut pieces = Vec::new();
    segment(text, whole, &config.separators, config.chunk_size, &mut pieces);

    let mut char_starts = Vec::with_capacity(pieces.len());
    let mut cursor = 0usize;
    for piece in &pieces {
        char_starts.push(cursor);
        cursor += piece.chars;
    }

    merge(&pieces, config.chunk_size, config.chunk_overlap)
        .into_iter()
        .map(|(first, last)| {
            let body = &text[pieces[first].start..pieces[last - 1].end];
            let start_offset = char_starts[first];
            Chunk {
                chunk_id: make_chunk_id(&page.document_id, page.page_number, start_offset, body),
                document_id: page.document_id.clone(),
                page_number: page.page_number,
                start_offset,
                text: body.to_string(),
                vector: None,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    chars: usize,
}

impl Span {
    fn new(text: &str, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            chars: text[start..end].chars().count(),
        }
    }
}

fn segment(text: &str, span: Span, separators: &[String], chunk_size: usize, out: &mut Vec<Span>) {
    if span.chars <= chunk_size {
        out.push(span);
        return;
    }

    let slice = &text[span.start..span.end];
    let found = separators
        .iter()
        .enumerate()
        .find(|(_, separator)| separator.is_empty() || slice.contains(separator.as_str()));

    let Some((index, separator)) = found else {
        // indivisible under the configured separators
        out.push(span);
        return;
    };

    if separator.is_empty() {
        hard_cut(text, span, chunk_size, out);
        return;
    }

    let finer = &separators[index + 1..];
    let mut piece_start = span.start;
    for (offset, matched) in slice.match_indices(separator.as_str()) {
        let piece_end = span.start + offset + matched.len();
        segment(text, Span::new(text, piece_start, piece_end), finer, chunk_size, out);
        piece_start = piece_end;
    }
    if piece_start < span.end {
        segment(text, Span::new(text, piece_start, span.end), finer, chunk_size, out);
    }
}

fn hard_cut(text: &str, span: Span, chunk_size: usize, out: &mut Vec<Span>) {
    let slice = &text[span.start..span.end];
    let mut piece_start = span.start;
    let mut count = 0usize;

    for (offset, _) in slice.char_indices() {
        if count == chunk_size {
            let piece_end = span.start + offset;
            out.push(Span {
                start: piece_start,
                end: piece_end,
                chars: count,
            });
            piece_start = piece_end;
            count = 0;
        }
        count += 1;
    }

    if count > 0 {
        out.push(Span {
            start: piece_start,
            end: span.end,
            chars: count,
        });
    }
}

/// Greedily packs contiguous pieces into windows of at most `chunk_size`
/// characters. Each new window is seeded with the trailing pieces of the
/// previous one, as long as they fit in `chunk_overlap` and leave room for
/// the next piece. Returns half-open piece index ranges.
fn merge(pieces: &[Span], chunk_size: usize, chunk_overlap: usize) -> Vec<(usize, usize)> {
    let mut windows = Vec::new();
    let mut first = 0usize;
    let mut total = 0usize;

    for (index, piece) in pieces.iter().enumerate() {
        if index > first && total + piece.chars > chunk_size {
            windows.push((first, index));

            let mut seed_start = index;
            let mut seed_total = 0usize;
            while seed_start > first {
                let candidate = pieces[seed_start - 1].chars;
                if seed_total + candidate > chunk_overlap
                    || seed_total + candidate + piece.chars > chunk_size
                {
                    break;
                }
                seed_total += candidate;
                seed_start -= 1;
            }

            first = seed_start;
            total = seed_total;
        }
        total += piece.chars;
    }

    if first < pieces.len() {
        windows.push((first, pieces.len()));
    }
    windows
}

fn make_chunk_id(document_id: &str, page: u32, start_offset: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update((start_offset as u64).to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
