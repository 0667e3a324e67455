use crate::model::{Combination, CombinationRecord, IdentityMap, ProductData, ProductId};

/// Product already persisted for a combination, compared structurally
pub fn find_product_id<'a>(
    identity: &'a IdentityMap,
    combination: &Combination,
) -> Option<&'a ProductId> {
    identity.lookup(combination)
}

pub fn find_combination_record<'a>(
    pending: &'a [CombinationRecord],
    combination: &Combination,
) -> Option<&'a CombinationRecord> {
    pending.iter().find(|record| &record.combination == combination)
}

pub fn find_combination_record_mut<'a>(
    pending: &'a mut [CombinationRecord],
    combination: &Combination,
) -> Option<&'a mut CombinationRecord> {
    pending
        .iter_mut()
        .find(|record| &record.combination == combination)
}

pub fn find_product_data<'a>(
    product_data: &'a [ProductData],
    product_id: &ProductId,
) -> Option<&'a ProductData> {
    product_data.iter().find(|data| &data.product_id == product_id)
}
