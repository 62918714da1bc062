//! Unit and property-based tests for docshape.


#[cfg(test)]
pub mod convert_tests;



#[cfg(test)]
pub(crate) fn converter() -> crate::Converter {
    crate::Converter::builder()
        .model(crate::StandardModel)
        .build()
        .unwrap()
}

#[cfg(test)]
pub(crate) fn field<'a>(descriptor: &'a crate::Descriptor, path: &str) -> &'a crate::FieldDescriptor {
    descriptor
        .get(path)
        .and_then(crate::Descriptor::as_field)
        .unwrap_or_else(|| panic!("no field at {}", path))
}
