//! Domain types backed by database rows.

pub mod content;
pub mod donation;
pub mod profile;
pub mod project;

pub use content::{ContentItem, ContentKind, GalleryItem, ImpactItem, Partner, TeamMember};
pub use donation::{
    AnnualDonationLine, Donation, DonationWithProject, NewDonation, NewTaxReceipt, TaxReceipt,
};
pub use profile::{Profile, ProfileUpdate};
pub use project::{NewProject, Project, ProjectUpdate, ProjectUpdatePatch};
