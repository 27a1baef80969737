//! GROQ queries issued by the page renderers

/// Every post, projected for the listing cards
pub const ALL_POSTS: &str = r#"*[_type == "post"]{
  _id,
  title,
  author-> {
    name,
    image
  },
  description,
  mainImage,
  slug
}"#;

/// Every post slug, for path enumeration
pub const ALL_SLUGS: &str = r#"*[_type == "post"]{
  _id,
  slug {
    current
  }
}"#;

/// One post by `$slug`, with its author expanded and approved comments attached
pub const POST_BY_SLUG: &str = r#"*[_type == "post" && slug.current == $slug][0]{
  _id,
  _createdAt,
  title,
  author-> {
    name,
    image
  },
  'comments': *[
    _type == "comment" &&
    post._ref == ^._id &&
    approved == true
  ],
  description,
  mainImage,
  slug,
  body
}"#;
