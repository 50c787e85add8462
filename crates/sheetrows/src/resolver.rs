use sheetrows_common::{AnchorKind, ImageAnchor, ImageAsset};
use std::collections::BTreeMap;

/// An image attributed to a row, with the column its anchor starts in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedImage<'a> {
    pub asset: &'a ImageAsset,
    pub column: u32,
}

/// Answers "which images sit on row R of this sheet".
///
/// Anchors on other sheets are discarded up front and the rest are indexed by
/// the single 1-based row that claims them, so every lookup depends only on
/// the anchors, the assets, the sheet and the row.
#[derive(Clone, Debug)]
pub struct ImageRowResolver<'a> {
    images: &'a [ImageAsset],
    by_row: BTreeMap<usize, Vec<&'a ImageAnchor>>,
}

impl<'a> ImageRowResolver<'a> {
    pub fn new(images: &'a [ImageAsset], anchors: &'a [ImageAnchor], sheet: &str) -> Self {
        let mut by_row: BTreeMap<usize, Vec<&'a ImageAnchor>> = BTreeMap::new();
        for anchor in anchors.iter().filter(|a| a.sheet_name == sheet) {
            if let Some(row) = claimed_row(anchor) {
                by_row.entry(row).or_default().push(anchor);
            }
        }
        Self { images, by_row }
    }

    /// Images for 1-based row `row`, ascending by column. Anchors sharing a
    /// column keep their original order.
    pub fn resolve(&self, row: usize) -> Vec<ResolvedImage<'a>> {
        let Some(anchors) = self.by_row.get(&row) else {
            return Vec::new();
        };
        let mut out: Vec<ResolvedImage<'a>> = anchors
            .iter()
            .filter_map(|anchor| match find_asset(self.images, &anchor.image_ref) {
                Some(asset) => Some(ResolvedImage {
                    asset,
                    column: anchor.from.col,
                }),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(image = %anchor.image_ref, row, "anchor has no matching image; dropped");
                    None
                }
            })
            .collect();
        out.sort_by_key(|r| r.column);
        out
    }
}

/// The 1-based row an anchor attaches to, if any.
///
/// An embedded anchor belongs to its only row. A floating anchor belongs to
/// its top row alone, not to the rows it visually covers below. An inverted
/// anchor belongs nowhere.
pub fn claimed_row(anchor: &ImageAnchor) -> Option<usize> {
    match anchor.kind()? {
        AnchorKind::Embedded => Some(anchor.from.row as usize + 1),
        AnchorKind::Floating => Some(anchor.from.row as usize + 1),
    }
}

/// Asset named by an anchor: exact name first, then containment either way
/// between two non-empty names. First match in collection order wins.
pub fn find_asset<'a>(images: &'a [ImageAsset], image_ref: &str) -> Option<&'a ImageAsset> {
    images.iter().find(|a| a.name == image_ref).or_else(|| {
        if image_ref.is_empty() {
            return None;
        }
        images.iter().find(|a| {
            !a.name.is_empty() && (a.name.contains(image_ref) || image_ref.contains(a.name.as_str()))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetrows_common::CellPos;

    fn asset(name: &str) -> ImageAsset {
        ImageAsset::new(name, "image/png", name.as_bytes().to_vec())
    }

    fn anchor(image: &str, sheet: &str, from: (u32, u32), to: (u32, u32)) -> ImageAnchor {
        ImageAnchor::new(
            image,
            sheet,
            CellPos::new(from.0, from.1),
            CellPos::new(to.0, to.1),
        )
    }

    fn names(found: &[ResolvedImage<'_>]) -> Vec<(String, u32)> {
        found
            .iter()
            .map(|r| (r.asset.name.clone(), r.column))
            .collect()
    }

    #[test]
    fn embedded_anchor_claims_only_its_row() {
        let images = vec![asset("image1.png")];
        let anchors = vec![anchor("image1.png", "S", (1, 2), (1, 2))];
        let r = ImageRowResolver::new(&images, &anchors, "S");
        assert!(r.resolve(2).is_empty());
        assert_eq!(names(&r.resolve(3)), vec![("image1.png".into(), 1)]);
        assert!(r.resolve(4).is_empty());
    }

    #[test]
    fn floating_anchor_claims_only_its_top_row() {
        let images = vec![asset("image1.png")];
        let anchors = vec![anchor("image1.png", "S", (0, 2), (3, 5))];
        let r = ImageRowResolver::new(&images, &anchors, "S");
        assert_eq!(names(&r.resolve(3)), vec![("image1.png".into(), 0)]);
        for row in 4..=6 {
            assert!(r.resolve(row).is_empty(), "row {row} should not claim the image");
        }
    }

    #[test]
    fn inverted_anchor_claims_nothing() {
        let a = anchor("image1.png", "S", (0, 5), (0, 2));
        assert_eq!(claimed_row(&a), None);
    }

    #[test]
    fn other_sheets_never_match() {
        let images = vec![asset("image1.png")];
        let anchors = vec![anchor("image1.png", "Other", (0, 0), (0, 0))];
        let r = ImageRowResolver::new(&images, &anchors, "S");
        assert!(r.resolve(1).is_empty());
    }

    #[test]
    fn exact_name_beats_earlier_substring_match() {
        let images = vec![asset("image10.png"), asset("image1.png")];
        assert_eq!(find_asset(&images, "image1.png").unwrap().name, "image1.png");
    }

    #[test]
    fn substring_match_works_both_ways() {
        let images = vec![asset("xl/media/image1.png")];
        assert!(find_asset(&images, "image1.png").is_some());
        let images = vec![asset("image1")];
        assert!(find_asset(&images, "media/image1.png").is_some());
    }

    #[test]
    fn empty_names_only_match_exactly() {
        let images = vec![asset(""), asset("image1.png")];
        assert_eq!(find_asset(&images, "").unwrap().name, "");
        let images = vec![asset("image1.png")];
        assert!(find_asset(&images, "").is_none());
        let images = vec![asset("")];
        assert!(find_asset(&images, "image1.png").is_none());
    }

    #[test]
    fn unmatched_anchor_is_dropped() {
        let images = vec![asset("image1.png")];
        let anchors = vec![
            anchor("chart9.emf", "S", (0, 0), (0, 0)),
            anchor("image1.png", "S", (2, 0), (2, 0)),
        ];
        let r = ImageRowResolver::new(&images, &anchors, "S");
        assert_eq!(names(&r.resolve(1)), vec![("image1.png".into(), 2)]);
    }

    #[test]
    fn results_sort_by_column_and_keep_ties_stable() {
        let images = vec![asset("a.png"), asset("b.png"), asset("c.png")];
        let anchors = vec![
            anchor("c.png", "S", (4, 1), (4, 1)),
            anchor("b.png", "S", (2, 1), (2, 1)),
            anchor("a.png", "S", (2, 1), (3, 4)),
        ];
        let r = ImageRowResolver::new(&images, &anchors, "S");
        assert_eq!(
            names(&r.resolve(2)),
            vec![
                ("b.png".into(), 2),
                ("a.png".into(), 2),
                ("c.png".into(), 4)
            ]
        );
    }
}
